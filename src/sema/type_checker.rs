use crate::lang::{BinaryOp, Expr, ExprKind, FunctionDecl, Program, Span, Stmt, StmtKind, Type, UnaryOp};
use crate::sema::symbol_table::{FunctionSignature, SymbolTable};
use crate::sema::type_error::TypeError;

/// Two-pass static checker.
///
/// Pass one registers every function signature in the global scope, so
/// bodies may call functions declared later (including mutual recursion).
/// Pass two checks each body. The first violation aborts the check.
pub struct TypeChecker {
    symbols: SymbolTable,
    current_function: Option<FunctionSignature>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker {
            symbols: SymbolTable::new(),
            current_function: None,
        }
    }

    pub fn check_program(&mut self, program: &Program) -> Result<(), TypeError> {
        for func in &program.functions {
            let signature = FunctionSignature {
                name: func.name.clone(),
                return_type: func.return_type.ty,
                param_types: func.params.iter().map(|p| p.ty.ty).collect(),
                param_names: func.params.iter().map(|p| p.name.clone()).collect(),
            };
            self.symbols
                .define_function(signature)
                .map_err(|e| TypeError::new(e.to_string(), func.span))?;
        }

        for func in &program.functions {
            self.check_function(func)?;
        }

        Ok(())
    }

    fn check_function(&mut self, func: &FunctionDecl) -> Result<(), TypeError> {
        self.current_function = self.symbols.lookup_function(&func.name).cloned();
        self.symbols.enter_scope();

        let result = self.check_function_body(func);

        self.symbols.exit_scope();
        self.current_function = None;
        result
    }

    fn check_function_body(&mut self, func: &FunctionDecl) -> Result<(), TypeError> {
        for param in &func.params {
            if param.ty.ty == Type::Void {
                return Err(TypeError::new(
                    format!("parameter '{}' cannot have type void", param.name),
                    param.ty.span,
                ));
            }
            self.symbols
                .define_variable(&param.name, param.ty.ty)
                .map_err(|e| TypeError::new(e.to_string(), func.span))?;
        }

        for stmt in &func.body {
            self.check_statement(stmt)?;
        }
        Ok(())
    }

    /// Checks a nested block in its own scope.
    fn check_block(&mut self, stmts: &[Stmt]) -> Result<(), TypeError> {
        self.symbols.enter_scope();
        let result = stmts.iter().try_for_each(|stmt| self.check_statement(stmt));
        self.symbols.exit_scope();
        result
    }

    fn check_statement(&mut self, stmt: &Stmt) -> Result<(), TypeError> {
        match &stmt.kind {
            StmtKind::VarDecl { ty, name, init } => {
                if ty.ty == Type::Void {
                    return Err(TypeError::new(
                        format!("variable '{}' cannot have type void", name),
                        stmt.span,
                    ));
                }

                if let Some(init) = init {
                    let init_ty = self.check_expression(init)?;
                    if init_ty != ty.ty {
                        return Err(TypeError::new(
                            format!(
                                "type mismatch in declaration of '{}': expected {}, got {}",
                                name, ty.ty, init_ty
                            ),
                            stmt.span,
                        ));
                    }
                }

                self.symbols
                    .define_variable(name, ty.ty)
                    .map_err(|e| TypeError::new(e.to_string(), stmt.span))
            }

            StmtKind::Assign { name, value } => {
                let var_ty = self.symbols.lookup_variable(name).ok_or_else(|| {
                    TypeError::new(format!("undefined variable '{}'", name), stmt.span)
                })?;

                let value_ty = self.check_expression(value)?;
                if value_ty != var_ty {
                    return Err(TypeError::new(
                        format!(
                            "type mismatch in assignment to '{}': expected {}, got {}",
                            name, var_ty, value_ty
                        ),
                        stmt.span,
                    ));
                }
                Ok(())
            }

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond, "if", stmt.span)?;
                self.check_block(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_block(else_branch)?;
                }
                Ok(())
            }

            StmtKind::While { cond, body } => {
                self.check_condition(cond, "while", stmt.span)?;
                self.check_block(body)
            }

            StmtKind::Return(value) => self.check_return(value.as_ref(), stmt.span),

            StmtKind::Expr(expr) => self.check_expression(expr).map(|_| ()),
        }
    }

    fn check_condition(&mut self, cond: &Expr, keyword: &str, span: Span) -> Result<(), TypeError> {
        let cond_ty = self.check_expression(cond)?;
        if cond_ty != Type::Bool {
            return Err(TypeError::new(
                format!("{} condition must be bool, got {}", keyword, cond_ty),
                span,
            ));
        }
        Ok(())
    }

    fn check_return(&mut self, value: Option<&Expr>, span: Span) -> Result<(), TypeError> {
        let expected = match &self.current_function {
            Some(signature) => signature.return_type,
            None => return Err(TypeError::new("return statement outside of function", span)),
        };

        match value {
            None if expected != Type::Void => Err(TypeError::new(
                format!("function must return a value of type {}", expected),
                span,
            )),
            None => Ok(()),
            Some(_) if expected == Type::Void => {
                Err(TypeError::new("void function cannot return a value", span))
            }
            Some(value) => {
                let actual = self.check_expression(value)?;
                if actual != expected {
                    return Err(TypeError::new(
                        format!(
                            "return type mismatch: expected {}, got {}",
                            expected, actual
                        ),
                        span,
                    ));
                }
                Ok(())
            }
        }
    }

    /// Checks an expression and returns its type.
    pub fn check_expression(&mut self, expr: &Expr) -> Result<Type, TypeError> {
        match &expr.kind {
            ExprKind::IntLiteral(_) => Ok(Type::Int),
            ExprKind::BoolLiteral(_) => Ok(Type::Bool),

            ExprKind::Variable(name) => self.symbols.lookup_variable(name).ok_or_else(|| {
                TypeError::new(format!("undefined variable '{}'", name), expr.span)
            }),

            ExprKind::Binary { op, left, right } => {
                let left_ty = self.check_expression(left)?;
                let right_ty = self.check_expression(right)?;
                check_binary(*op, left_ty, right_ty, expr.span)
            }

            ExprKind::Unary { op, operand } => {
                let operand_ty = self.check_expression(operand)?;
                let (expected, result) = match op {
                    UnaryOp::Neg => (Type::Int, Type::Int),
                    UnaryOp::Not => (Type::Bool, Type::Bool),
                };
                if operand_ty != expected {
                    return Err(TypeError::new(
                        format!(
                            "operand of '{}' must be {}, got {}",
                            op, expected, operand_ty
                        ),
                        expr.span,
                    ));
                }
                Ok(result)
            }

            ExprKind::Call { name, args } => self.check_call(name, args, expr.span),
        }
    }

    fn check_call(&mut self, name: &str, args: &[Expr], span: Span) -> Result<Type, TypeError> {
        let signature = self
            .symbols
            .lookup_function(name)
            .cloned()
            .ok_or_else(|| TypeError::new(format!("undefined function '{}'", name), span))?;

        if args.len() != signature.param_types.len() {
            return Err(TypeError::new(
                format!(
                    "function '{}' expects {} argument(s), got {}",
                    name,
                    signature.param_types.len(),
                    args.len()
                ),
                span,
            ));
        }

        for (i, (arg, expected)) in args.iter().zip(&signature.param_types).enumerate() {
            let actual = self.check_expression(arg)?;
            if actual != *expected {
                return Err(TypeError::new(
                    format!(
                        "argument {} of '{}': expected {}, got {}",
                        i + 1,
                        name,
                        expected,
                        actual
                    ),
                    span,
                ));
            }
        }

        Ok(signature.return_type)
    }
}

/// Operand and result types of a binary operator.
fn check_binary(op: BinaryOp, left: Type, right: Type, span: Span) -> Result<Type, TypeError> {
    let operand_ty = match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            Some(Type::Int)
        }
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => Some(Type::Int),
        BinaryOp::And | BinaryOp::Or => Some(Type::Bool),
        // any type, as long as both sides agree
        BinaryOp::Eq | BinaryOp::Ne => None,
    };

    match operand_ty {
        Some(expected) => {
            if left != expected {
                return Err(TypeError::new(
                    format!("left operand of '{}' must be {}, got {}", op, expected, left),
                    span,
                ));
            }
            if right != expected {
                return Err(TypeError::new(
                    format!("right operand of '{}' must be {}, got {}", op, expected, right),
                    span,
                ));
            }
        }
        None => {
            if left != right {
                return Err(TypeError::new(
                    format!(
                        "operands of '{}' must have the same type, got {} and {}",
                        op, left, right
                    ),
                    span,
                ));
            }
        }
    }

    let result = match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => Type::Int,
        _ => Type::Bool,
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{Lexer, Parser};

    fn check(source: &str) -> Result<(), TypeError> {
        let tokens = Lexer::new(source).tokenize().expect("lexing should succeed");
        let program = Parser::new(tokens).parse().expect("parsing should succeed");
        TypeChecker::new().check_program(&program)
    }

    fn assert_ok(source: &str) {
        if let Err(e) = check(source) {
            panic!("expected program to type check, got: {}", e);
        }
    }

    fn assert_error(source: &str, error_contains: &str) {
        match check(source) {
            Ok(()) => panic!("expected type error containing '{}'", error_contains),
            Err(e) => assert!(
                e.message.contains(error_contains),
                "expected error containing '{}', got: {}",
                error_contains,
                e.message
            ),
        }
    }

    #[test]
    fn test_matching_declaration() {
        assert_ok("int main() { int x = 1; bool b = true; return x; }");
    }

    #[test]
    fn test_declaration_mismatch() {
        assert_error("int main() { int x = true; return 0; }", "type mismatch");
        assert_error("int main() { bool b = 1; return 0; }", "expected bool, got int");
    }

    #[test]
    fn test_declaration_error_position() {
        let err = check("int main() {\n  int x = true;\n  return 0;\n}").unwrap_err();
        assert_eq!(err.span(), Span::new(2, 3));
    }

    #[test]
    fn test_duplicate_variable_in_scope() {
        assert_error(
            "int main() { int x = 1; int x = 2; return x; }",
            "already defined",
        );
    }

    #[test]
    fn test_parameter_and_local_share_scope() {
        assert_error("int f(int a) { int a = 1; return a; } int main() { return 0; }", "'a' already defined");
    }

    #[test]
    fn test_duplicate_parameter() {
        assert_error("int f(int a, int a) { return a; } int main() { return 0; }", "already defined");
    }

    #[test]
    fn test_duplicate_function() {
        assert_error("int f() { return 1; } int f() { return 2; }", "function 'f' already defined");
    }

    #[test]
    fn test_void_variable_rejected() {
        assert_error("int main() { void v; return 0; }", "cannot have type void");
        assert_error("int f(void v) { return 0; } int main() { return 0; }", "cannot have type void");
    }

    #[test]
    fn test_assignment() {
        assert_ok("int main() { int x = 1; x = x + 1; return x; }");
        assert_error("int main() { y = 1; return 0; }", "undefined variable 'y'");
        assert_error("int main() { int x = 1; x = false; return 0; }", "type mismatch in assignment");
    }

    #[test]
    fn test_conditions_must_be_bool() {
        assert_error("int main() { if (1) { return 1; } return 0; }", "if condition must be bool");
        assert_error("int main() { while (0) { } return 0; }", "while condition must be bool");
        assert_ok("int main() { if (1 < 2) { return 1; } while (false) { } return 0; }");
    }

    #[test]
    fn test_block_variable_not_visible_after_block() {
        assert_error(
            "int main() { if (true) { int y = 1; } return y; }",
            "undefined variable 'y'",
        );
        assert_error(
            "int main() { while (false) { int z = 1; } return z; }",
            "undefined variable 'z'",
        );
        assert_error(
            "int main() { if (true) { } else { int w = 1; } return w; }",
            "undefined variable 'w'",
        );
    }

    #[test]
    fn test_shadowing_in_nested_block() {
        assert_ok("int main() { int x = 1; if (true) { bool x = false; } return x; }");
        assert_ok("int main() { int x = 1; while (false) { int x = 2; x = 3; } return x; }");
    }

    #[test]
    fn test_return_rules() {
        assert_ok("void f() { return; } int main() { return 0; }");
        assert_error("void f() { return 1; } int main() { return 0; }", "void function cannot return a value");
        assert_error("int main() { return; }", "must return a value of type int");
        assert_error("int main() { return true; }", "return type mismatch: expected int, got bool");
        assert_ok("bool f() { return 1 == 1; } int main() { return 0; }");
    }

    #[test]
    fn test_arithmetic_requires_int() {
        assert_ok("int main() { return 1 + 2 * 3 / 4 % 5 - 6; }");
        assert_error("int main() { return true + 1; }", "left operand of '+' must be int, got bool");
        assert_error("int main() { return 1 * false; }", "right operand of '*' must be int, got bool");
    }

    #[test]
    fn test_relational_yields_bool() {
        assert_ok("int main() { bool b = 1 <= 2; return 0; }");
        assert_error("int main() { int x = 1 < 2; return 0; }", "expected int, got bool");
        assert_error("int main() { bool b = true < false; return 0; }", "must be int");
    }

    #[test]
    fn test_equality_needs_same_types() {
        assert_ok("int main() { bool a = 1 == 2; bool b = true != false; return 0; }");
        assert_error("int main() { bool b = 1 == true; return 0; }", "must have the same type");
    }

    #[test]
    fn test_logical_requires_bool() {
        assert_ok("int main() { bool b = true && !false || false; return 0; }");
        assert_error("int main() { bool b = 1 && true; return 0; }", "left operand of '&&' must be bool");
    }

    #[test]
    fn test_unary_operators() {
        assert_ok("int main() { int x = --1; bool b = !!true; return x; }");
        assert_error("int main() { return -true; }", "operand of '-' must be int, got bool");
        assert_error("int main() { bool b = !1; return 0; }", "operand of '!' must be bool, got int");
    }

    #[test]
    fn test_forward_reference_and_mutual_recursion() {
        assert_ok("int main() { return later(); } int later() { return 7; }");
        assert_ok(
            "bool even(int n) { if (n == 0) { return true; } return odd(n - 1); }
             bool odd(int n) { if (n == 0) { return false; } return even(n - 1); }
             int main() { if (even(4)) { return 1; } return 0; }",
        );
    }

    #[test]
    fn test_calls() {
        assert_error("int main() { return missing(); }", "undefined function 'missing'");
        assert_error(
            "int f(int a) { return a; } int main() { return f(); }",
            "expects 1 argument(s), got 0",
        );
        assert_error(
            "int f(int a, bool b) { return a; } int main() { return f(1, 2); }",
            "argument 2 of 'f': expected bool, got int",
        );
        assert_error(
            "void f() { return; } int main() { int x = f(); return x; }",
            "expected int, got void",
        );
        assert_ok("void f() { return; } int main() { f(); return 0; }");
    }

    #[test]
    fn test_parameters_visible_in_body() {
        assert_ok("int f(int a, bool b) { if (b) { return a; } return -a; } int main() { return f(1, true); }");
    }

    #[test]
    fn test_checker_can_be_reused_for_expressions() {
        let tokens = Lexer::new("1 + 2 < 4").tokenize().unwrap();
        let expr = Parser::new(tokens).parse_expression().unwrap();
        assert_eq!(TypeChecker::new().check_expression(&expr), Ok(Type::Bool));
    }
}
