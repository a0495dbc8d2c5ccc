//! Lookup tool set
//!
//! The reasoning agent gathers facts through a small set of named lookup
//! tools. Each tool is a pure function of a short text argument to a text
//! report; the registry owns the name → (description, parameter, handler)
//! mapping and produces the wire declarations handed to the backend.

pub mod lookups;

pub use lookups::default_registry;

use anyhow::{anyhow, Result};

use crate::backend::{ToolDecl, ToolFunctionDecl};

/// One callable information source.
pub struct LookupTool {
    pub name: &'static str,
    pub description: &'static str,
    /// Name of the single string parameter
    pub parameter: &'static str,
    handler: fn(&str) -> Result<String>,
}

impl LookupTool {
    pub fn new(
        name: &'static str,
        description: &'static str,
        parameter: &'static str,
        handler: fn(&str) -> Result<String>,
    ) -> Self {
        Self {
            name,
            description,
            parameter,
            handler,
        }
    }

    pub fn call(&self, argument: &str) -> Result<String> {
        (self.handler)(argument)
    }

    pub fn declaration(&self) -> ToolDecl {
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.parameter.to_string(),
            serde_json::json!({"type": "string"}),
        );
        ToolDecl {
            decl_type: "function".to_string(),
            function: ToolFunctionDecl {
                name: self.name.to_string(),
                description: self.description.to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": [self.parameter]
                }),
            },
        }
    }
}

/// Declaration-ordered collection of lookup tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<LookupTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: LookupTool) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&LookupTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Run the named tool. Unknown names are an error; handler failures
    /// propagate for the caller to fold into the conversation.
    pub fn execute(&self, name: &str, argument: &str) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| anyhow!("unknown lookup tool '{}'", name))?;
        tool.call(argument)
    }

    /// Wire declarations in registration order.
    pub fn declarations(&self) -> Vec<ToolDecl> {
        self.tools.iter().map(|t| t.declaration()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(arg: &str) -> Result<String> {
        Ok(format!("echo: {arg}"))
    }

    fn boom(_arg: &str) -> Result<String> {
        Err(anyhow!("datasource offline"))
    }

    #[test]
    fn test_execute_known_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(LookupTool::new("echo", "Echo back", "text", echo));
        let out = registry.execute("echo", "hello").unwrap();
        assert_eq!(out, "echo: hello");
    }

    #[test]
    fn test_execute_unknown_tool_errors() {
        let registry = ToolRegistry::new();
        assert!(registry.execute("nope", "x").is_err());
    }

    #[test]
    fn test_handler_failure_propagates() {
        let mut registry = ToolRegistry::new();
        registry.register(LookupTool::new("boom", "Always fails", "text", boom));
        let err = registry.execute("boom", "x").unwrap_err();
        assert!(err.to_string().contains("datasource offline"));
    }

    #[test]
    fn test_declaration_shape() {
        let tool = LookupTool::new("detect_conflicts", "Find schedule conflicts", "implementation_date", echo);
        let decl = tool.declaration();
        assert_eq!(decl.decl_type, "function");
        assert_eq!(decl.function.name, "detect_conflicts");
        let params = &decl.function.parameters;
        assert_eq!(params["required"][0], "implementation_date");
        assert_eq!(
            params["properties"]["implementation_date"]["type"],
            "string"
        );
    }

    #[test]
    fn test_declarations_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(LookupTool::new("b", "B", "x", echo));
        registry.register(LookupTool::new("a", "A", "x", echo));
        let names: Vec<String> = registry
            .declarations()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
