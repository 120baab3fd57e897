/// Linked shader program trait and descriptor
///
/// Shader compilation and linking belong to the backend. The core only
/// needs to resolve attribute and uniform names to locations.

/// Descriptor for creating a program
///
/// Lists the vertex attributes and uniforms the linked program exposes,
/// in location order.
#[derive(Debug, Clone, Default)]
pub struct ProgramDesc {
    /// Debug name
    pub name: String,
    /// Vertex attribute names, location = index
    pub attributes: Vec<String>,
    /// Uniform names, location = index
    pub uniforms: Vec<String>,
}

/// Program resource trait
pub trait Program: Send + Sync {
    /// Debug name
    fn name(&self) -> &str;

    /// Whether the program linked successfully
    ///
    /// A program that failed to build is still handed back to the caller;
    /// the failure has already been logged.
    fn is_linked(&self) -> bool;

    /// Vertex attribute location by name
    fn attribute_location(&self, name: &str) -> Option<u32>;

    /// Uniform location by name
    fn uniform_location(&self, name: &str) -> Option<u32>;
}
