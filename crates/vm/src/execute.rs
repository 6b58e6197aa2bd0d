//! Statement execution and function calls.

use std::collections::HashMap;

use bitlang_common::ast::{AssignOp, Block, Place};
use bitlang_common::stack::ensure_sufficient_stack;
use bitlang_common::{Expr, ExprKind, Position, Statement, StmtKind, Type, Value, Width};

use crate::error::RuntimeError;
use crate::machine::{CallFrame, VM};
use crate::ops::{self, Fault};

/// How control leaves a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Flow {
    Next,
    Break,
    Continue,
    /// Propagates through enclosing blocks until the frame completes.
    Return(Option<Value>),
}

impl<'a> VM<'a> {
    /// Execute the top-level statements in source order.
    ///
    /// A top-level `return` completes the run early.
    pub fn execute(&mut self) -> Result<(), RuntimeError> {
        let program = self.program;
        for stmt in program.statements() {
            if let Flow::Return(_) = self.exec_statement(stmt)? {
                tracing::debug!(at = %stmt.at, "top-level return");
                break;
            }
        }
        Ok(())
    }

    /// Run statements in the current scope, stopping at the first
    /// non-`Next` flow.
    fn exec_statements(&mut self, stmts: &'a [Statement]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            let flow = self.exec_statement(stmt)?;
            if flow != Flow::Next {
                return Ok(flow);
            }
        }
        Ok(Flow::Next)
    }

    /// Run a block in a fresh scope.
    fn exec_block(&mut self, block: &'a Block, scope: HashMap<&'a str, Value>) -> Result<Flow, RuntimeError> {
        self.push_scope(scope);
        let flow = self.exec_statements(block);
        self.pop_scope();
        flow
    }

    fn exec_statement(&mut self, stmt: &'a Statement) -> Result<Flow, RuntimeError> {
        ensure_sufficient_stack(|| self.exec_statement_inner(stmt))
    }

    fn exec_statement_inner(&mut self, stmt: &'a Statement) -> Result<Flow, RuntimeError> {
        tracing::trace!(at = %stmt.at, depth = self.depth(), "statement");

        match &stmt.kind {
            StmtKind::Let { name, ty, value } => {
                let value = self.eval(value, scalar_width(ty))?;
                expect_type(&value, ty, stmt.at)?;
                self.declare(name, value);
            }
            // Registered with the function before the first call.
            StmtKind::Static(_) => {}
            StmtKind::Assign { op, place, value } => self.exec_assign(*op, place, value, stmt.at)?,
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                let test = self.eval(cond, None)?;
                if test.as_scalar().is_none() {
                    return Err(RuntimeError::ScalarExpected {
                        at: cond.at,
                        found: test.type_of(),
                    });
                }
                if test.is_truthy() {
                    return self.exec_block(then, HashMap::new());
                }
                if let Some(otherwise) = otherwise {
                    return self.exec_block(otherwise, HashMap::new());
                }
            }
            StmtKind::For {
                var,
                ty,
                start,
                end,
                body,
            } => return self.exec_for(var, ty.width(), start, end, body),
            StmtKind::Loop(body) => loop {
                match self.exec_block(body, HashMap::new())? {
                    Flow::Next | Flow::Continue => {}
                    Flow::Break => break,
                    flow @ Flow::Return(_) => return Ok(flow),
                }
            },
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Return(None) => return Ok(Flow::Return(None)),
            StmtKind::Return(Some(value)) => {
                let hint = self
                    .current_function()
                    .and_then(|f| f.ret.as_ref())
                    .and_then(scalar_width);
                let value = self.eval(value, hint)?;
                return Ok(Flow::Return(Some(value)));
            }
            StmtKind::Panic => {
                let function = self.frame().and_then(CallFrame::function_name);
                tracing::debug!(at = %stmt.at, function, depth = self.depth(), "explicit panic");
                return Err(RuntimeError::ExplicitPanic {
                    at: stmt.at,
                    function: function.map(str::to_string),
                });
            }
            StmtKind::Expr(expr) => match &expr.kind {
                // A statement call may target a function without a value.
                ExprKind::Call { name, args } => {
                    self.call(name, args, expr.at)?;
                }
                _ => {
                    self.eval(expr, None)?;
                }
            },
        }

        Ok(Flow::Next)
    }

    /// `for var:ty in start..end`: bounds are evaluated once, the range is
    /// exclusive, and `var` is a fresh binding each iteration.
    fn exec_for(
        &mut self,
        var: &'a str,
        width: Width,
        start: &'a Expr,
        end: &'a Expr,
        body: &'a Block,
    ) -> Result<Flow, RuntimeError> {
        let start = self.eval_width(start, width)?;
        let end = self.eval_width(end, width)?;

        for i in start..end {
            let scope = HashMap::from([(var, Value::wrapped(width, u128::from(i)))]);
            match self.exec_block(body, scope)? {
                Flow::Next | Flow::Continue => {}
                Flow::Break => break,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }

        Ok(Flow::Next)
    }

    /// `(= place value)`, `(+= place value)`, `(-= place value)`.
    ///
    /// The index is evaluated first, then the current value is read (for
    /// `+=`/`-=`), then the right-hand side.
    fn exec_assign(
        &mut self,
        op: AssignOp,
        place: &'a Place,
        value: &'a Expr,
        at: Position,
    ) -> Result<(), RuntimeError> {
        let (name, index) = match place {
            Place::Var(name) => (name.as_str(), None),
            Place::Element { index, array } => (array.as_str(), Some(self.eval_index(index)?)),
        };

        // Type of the target, and its current value if it is a scalar.
        let target = self.read(name, at)?;
        let (ty, current) = match index {
            None => (target.type_of(), target.as_scalar().map(|(_, bits)| bits)),
            Some(i) => match target {
                Value::Array { element, items } => {
                    let bits = target.element(i).and_then(|v| v.as_scalar()).map(|(_, b)| b);
                    match bits {
                        Some(bits) => (Type::Uint(*element), Some(bits)),
                        None => {
                            return Err(RuntimeError::IndexOutOfBounds {
                                at,
                                array: name.to_string(),
                                index: i,
                                len: items.len(),
                            })
                        }
                    }
                }
                Value::Scalar { .. } => {
                    return Err(RuntimeError::NotAnArray {
                        at,
                        name: name.to_string(),
                    })
                }
            },
        };

        let new = match (op.bin_op(), current) {
            (None, _) => {
                let new = self.eval(value, scalar_width(&ty))?;
                expect_type(&new, &ty, value.at)?;
                new
            }
            (Some(bin), Some(current)) => {
                let width = ty.width();
                let rhs = self.eval_width(value, width)?;
                ops::apply(bin, width, current, rhs, self.config.overflow).map_err(|fault| {
                    match fault {
                        Fault::DivisionByZero => RuntimeError::DivisionByZero { at },
                        Fault::Overflow => RuntimeError::ArithmeticOverflow {
                            at,
                            op: op.symbol(),
                            width,
                        },
                    }
                })?
            }
            (Some(_), None) => {
                return Err(RuntimeError::ScalarExpected { at, found: ty });
            }
        };

        let slot = self.slot_mut(name, at)?;
        match (index, new) {
            (None, new) => *slot = new,
            (Some(i), Value::Scalar { bits, .. }) => {
                slot.set_element(i, bits);
            }
            (Some(_), new) => {
                return Err(RuntimeError::ScalarExpected {
                    at,
                    found: new.type_of(),
                })
            }
        }
        Ok(())
    }

    /// Call a function: arguments left to right in the caller's frame, then
    /// arity and parameter types, then the body in a fresh frame.
    ///
    /// Returns `None` for functions without a return type.
    pub(crate) fn call(
        &mut self,
        name: &str,
        args: &'a [Expr],
        at: Position,
    ) -> Result<Option<Value>, RuntimeError> {
        let function = self.functions.get(name).ok_or_else(|| RuntimeError::Unresolved {
            at,
            name: name.to_string(),
        })?;

        let mut values = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let hint = function.params.get(i).and_then(|p| scalar_width(&p.ty));
            values.push(self.eval(arg, hint)?);
        }

        if values.len() != function.params.len() {
            return Err(RuntimeError::ArityMismatch {
                at,
                function: function.name.clone(),
                expected: function.params.len(),
                found: values.len(),
            });
        }

        let mut params = HashMap::with_capacity(values.len());
        for ((param, arg), value) in function.params.iter().zip(args).zip(values) {
            expect_type(&value, &param.ty, arg.at)?;
            params.insert(param.name.as_str(), value);
        }

        if self.depth() >= self.config.max_call_depth {
            return Err(RuntimeError::StackExhausted {
                at,
                limit: self.config.max_call_depth,
            });
        }

        self.frames.push(CallFrame::call(function, params));
        tracing::debug!(function = %function.name, depth = self.depth(), "call");

        // The body runs in the parameter scope.
        let flow = ensure_sufficient_stack(|| self.exec_statements(&function.body));
        self.frames.pop();
        let flow = flow?;

        let result = match (flow, &function.ret) {
            (Flow::Return(Some(value)), Some(ty)) => {
                expect_type(&value, ty, at)?;
                Some(value)
            }
            (_, None) => None,
            (_, Some(_)) => {
                return Err(RuntimeError::MissingReturn {
                    at: function.at,
                    function: function.name.clone(),
                })
            }
        };

        tracing::debug!(function = %function.name, value = ?result, "return");
        Ok(result)
    }
}

/// Width a literal should take when it initializes a value of `ty`.
fn scalar_width(ty: &Type) -> Option<Width> {
    match ty {
        Type::Uint(width) => Some(*width),
        Type::Array { .. } => None,
    }
}

fn expect_type(value: &Value, ty: &Type, at: Position) -> Result<(), RuntimeError> {
    let found = value.type_of();
    if found == *ty {
        Ok(())
    } else {
        Err(RuntimeError::TypeMismatch {
            at,
            expected: *ty,
            found,
        })
    }
}
