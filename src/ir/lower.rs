use std::collections::{HashMap, HashSet};

use crate::ir::instr::{Instr, ValueRef};
use crate::lang::{Expr, ExprKind, FunctionDecl, Program, Stmt, StmtKind, Type};

/// Prefix of the label that marks a function's entry point.
pub const FUNCTION_LABEL_PREFIX: &str = "func_";

pub fn function_label(name: &str) -> String {
    format!("{}{}", FUNCTION_LABEL_PREFIX, name)
}

/// Lowers a type-checked AST to a flat list of three-address instructions.
///
/// The generator assumes its input passed the type checker; it does not
/// re-validate names or types.
pub struct IrGenerator {
    instrs: Vec<Instr>,
    temp_count: usize,
    label_count: usize,
    shadow_count: usize,

    /// Functions whose calls produce no value.
    void_functions: HashSet<String>,

    /// Source name -> IR name, one map per open block.
    scopes: Vec<HashMap<String, String>>,
}

impl Default for IrGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IrGenerator {
    pub fn new() -> Self {
        Self {
            instrs: Vec::new(),
            temp_count: 0,
            label_count: 0,
            shadow_count: 0,
            void_functions: HashSet::new(),
            scopes: Vec::new(),
        }
    }

    pub fn generate(mut self, program: &Program) -> Vec<Instr> {
        self.void_functions = program
            .functions
            .iter()
            .filter(|f| f.return_type.ty == Type::Void)
            .map(|f| f.name.clone())
            .collect();

        for func in &program.functions {
            self.gen_function(func);
        }

        self.instrs
    }

    fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    fn new_temp(&mut self) -> String {
        let name = format!("t{}", self.temp_count);
        self.temp_count += 1;
        name
    }

    fn new_label(&mut self) -> String {
        let name = format!("L{}", self.label_count);
        self.label_count += 1;
        name
    }

    // Scopes

    fn resolve(&self, name: &str) -> String {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
            .unwrap_or_else(|| name.to_string())
    }

    /// Binds a declared name in the innermost block. A name already visible
    /// from an enclosing block gets a fresh IR name so the outer storage
    /// slot is left alone.
    fn declare(&mut self, name: &str) -> String {
        let visible = self.scopes.iter().any(|scope| scope.contains_key(name));
        let ir_name = if visible {
            let renamed = format!("{}.{}", name, self.shadow_count);
            self.shadow_count += 1;
            renamed
        } else {
            name.to_string()
        };

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ir_name.clone());
        }
        ir_name
    }

    // Functions and statements

    fn gen_function(&mut self, func: &FunctionDecl) {
        self.emit(Instr::Label(function_label(&func.name)));

        // parameters live in the function's own scope, under their own names
        let params = func
            .params
            .iter()
            .map(|p| (p.name.clone(), p.name.clone()))
            .collect();
        self.scopes.push(params);

        for stmt in &func.body {
            self.gen_statement(stmt);
        }
        self.scopes.pop();

        let ends_in_return = matches!(
            func.body.last(),
            Some(Stmt {
                kind: StmtKind::Return(_),
                ..
            })
        );
        if !ends_in_return {
            self.emit(Instr::Return(None));
        }
    }

    fn gen_block(&mut self, stmts: &[Stmt]) {
        self.scopes.push(HashMap::new());
        for stmt in stmts {
            self.gen_statement(stmt);
        }
        self.scopes.pop();
    }

    fn gen_statement(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl { name, init, .. } => {
                let source = match init {
                    Some(init) => self.gen_expression(init),
                    None => ValueRef::Const(0),
                };
                // declared after the initializer: `int x = x + 1;` in a nested
                // block reads the outer `x`
                let dest = self.declare(name);
                self.emit(Instr::Copy { dest, source });
            }

            StmtKind::Assign { name, value } => {
                let source = self.gen_expression(value);
                let dest = self.resolve(name);
                self.emit(Instr::Copy { dest, source });
            }

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.gen_expression(cond);
                let then_label = self.new_label();
                let end_label = self.new_label();

                self.emit(Instr::CondJump {
                    cond,
                    label: then_label.clone(),
                });
                if let Some(else_branch) = else_branch {
                    self.gen_block(else_branch);
                }
                self.emit(Instr::Jump(end_label.clone()));

                self.emit(Instr::Label(then_label));
                self.gen_block(then_branch);
                self.emit(Instr::Label(end_label));
            }

            StmtKind::While { cond, body } => {
                let start_label = self.new_label();
                let body_label = self.new_label();
                let end_label = self.new_label();

                self.emit(Instr::Label(start_label.clone()));
                let cond = self.gen_expression(cond);
                self.emit(Instr::CondJump {
                    cond,
                    label: body_label.clone(),
                });
                self.emit(Instr::Jump(end_label.clone()));

                self.emit(Instr::Label(body_label));
                self.gen_block(body);
                self.emit(Instr::Jump(start_label));
                self.emit(Instr::Label(end_label));
            }

            StmtKind::Return(value) => {
                let value = value.as_ref().map(|v| self.gen_expression(v));
                self.emit(Instr::Return(value));
            }

            StmtKind::Expr(expr) => {
                self.gen_expression(expr);
            }
        }
    }

    // Expressions

    fn gen_expression(&mut self, expr: &Expr) -> ValueRef {
        match &expr.kind {
            ExprKind::IntLiteral(n) => ValueRef::Const(*n),
            ExprKind::BoolLiteral(b) => ValueRef::Const(i64::from(*b)),
            ExprKind::Variable(name) => ValueRef::Name(self.resolve(name)),

            ExprKind::Binary { op, left, right } => {
                let left = self.gen_expression(left);
                let right = self.gen_expression(right);
                let dest = self.new_temp();
                self.emit(Instr::Binary {
                    dest: dest.clone(),
                    op: *op,
                    left,
                    right,
                });
                ValueRef::Name(dest)
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.gen_expression(operand);
                let dest = self.new_temp();
                self.emit(Instr::Unary {
                    dest: dest.clone(),
                    op: *op,
                    operand,
                });
                ValueRef::Name(dest)
            }

            ExprKind::Call { name, args } => {
                let args: Vec<ValueRef> = args.iter().map(|a| self.gen_expression(a)).collect();
                for arg in &args {
                    self.emit(Instr::Param(arg.clone()));
                }

                if self.void_functions.contains(name) {
                    self.emit(Instr::Call {
                        dest: None,
                        function: name.clone(),
                        args,
                    });
                    ValueRef::Const(0)
                } else {
                    let dest = self.new_temp();
                    self.emit(Instr::Call {
                        dest: Some(dest.clone()),
                        function: name.clone(),
                        args,
                    });
                    ValueRef::Name(dest)
                }
            }
        }
    }
}
