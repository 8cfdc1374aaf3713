use std::collections::HashMap;

use crate::lang::Type;

/// A function's type as seen by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: Type,
    pub param_types: Vec<Type>,
    pub param_names: Vec<String>,
}

impl std::fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, (ty, name)) in self.param_types.iter().zip(&self.param_names).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", ty, name)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SymbolError {
    #[error("variable '{0}' already defined in this scope")]
    DuplicateVariable(String),

    #[error("function '{0}' already defined")]
    DuplicateFunction(String),
}

#[derive(Debug, Default)]
struct Scope {
    variables: HashMap<String, Type>,
    functions: HashMap<String, FunctionSignature>,
}

/// Scope-chained name resolution.
///
/// Scopes form a stack: the global scope sits at index 0 and the current
/// scope is always the last one. A scope's parent is the entry below it, so
/// lookups walk the stack from the top down and `exit_scope` drops every
/// name the scope defined.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
        }
    }

    /// Number of open scopes, counting the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Discards the current scope. The global scope is never discarded.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn current(&mut self) -> &mut Scope {
        // never empty: `exit_scope` keeps the global scope
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Defines a variable in the current scope.
    ///
    /// Fails only on a duplicate in the same scope; a name from an enclosing
    /// scope is shadowed.
    pub fn define_variable(&mut self, name: &str, ty: Type) -> Result<(), SymbolError> {
        let scope = self.current();
        if scope.variables.contains_key(name) {
            return Err(SymbolError::DuplicateVariable(name.to_string()));
        }
        scope.variables.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn lookup_variable(&self, name: &str) -> Option<Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(name).copied())
    }

    pub fn define_function(&mut self, signature: FunctionSignature) -> Result<(), SymbolError> {
        let scope = self.current();
        if scope.functions.contains_key(&signature.name) {
            return Err(SymbolError::DuplicateFunction(signature.name));
        }
        scope.functions.insert(signature.name.clone(), signature);
        Ok(())
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FunctionSignature> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.functions.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(name: &str, return_type: Type) -> FunctionSignature {
        FunctionSignature {
            name: name.to_string(),
            return_type,
            param_types: vec![Type::Int, Type::Bool],
            param_names: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[test]
    fn test_define_and_lookup() {
        let mut table = SymbolTable::new();
        table.define_variable("x", Type::Int).unwrap();
        assert_eq!(table.lookup_variable("x"), Some(Type::Int));
        assert_eq!(table.lookup_variable("y"), None);
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut table = SymbolTable::new();
        table.define_variable("x", Type::Int).unwrap();
        assert_eq!(
            table.define_variable("x", Type::Bool),
            Err(SymbolError::DuplicateVariable("x".to_string()))
        );
    }

    #[test]
    fn test_shadowing_in_child_scope() {
        let mut table = SymbolTable::new();
        table.define_variable("x", Type::Int).unwrap();

        table.enter_scope();
        table.define_variable("x", Type::Bool).unwrap();
        assert_eq!(table.lookup_variable("x"), Some(Type::Bool));

        table.exit_scope();
        assert_eq!(table.lookup_variable("x"), Some(Type::Int));
    }

    #[test]
    fn test_exit_scope_drops_names() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.define_variable("inner", Type::Int).unwrap();
        table.enter_scope();
        assert_eq!(table.lookup_variable("inner"), Some(Type::Int));
        table.exit_scope();
        table.exit_scope();
        assert_eq!(table.lookup_variable("inner"), None);
    }

    #[test]
    fn test_global_scope_survives_extra_exit() {
        let mut table = SymbolTable::new();
        table.define_variable("g", Type::Int).unwrap();
        table.exit_scope();
        table.exit_scope();
        assert_eq!(table.depth(), 1);
        assert_eq!(table.lookup_variable("g"), Some(Type::Int));
    }

    #[test]
    fn test_functions_visible_from_nested_scopes() {
        let mut table = SymbolTable::new();
        table.define_function(signature("f", Type::Int)).unwrap();
        table.enter_scope();
        table.enter_scope();
        let found = table.lookup_function("f").expect("f should resolve");
        assert_eq!(found.return_type, Type::Int);
        assert!(table.lookup_function("g").is_none());
    }

    #[test]
    fn test_duplicate_function() {
        let mut table = SymbolTable::new();
        table.define_function(signature("f", Type::Int)).unwrap();
        assert_eq!(
            table.define_function(signature("f", Type::Void)),
            Err(SymbolError::DuplicateFunction("f".to_string()))
        );
    }

    #[test]
    fn test_signature_display() {
        assert_eq!(signature("f", Type::Int).to_string(), "int f(int a, bool b)");
    }
}
