//! Tree-walking evaluator over the desktop object graph.

use std::sync::Arc;

use rrepl::{Diagnostic, Evaluation, Evaluator, Repl, ScopeRef, Target};
use tracing::{debug, trace};

use crate::desktop::Desktop;
use crate::parser::{BinaryOp, Expr, ParseError, Stmt, UnaryOp, parse};
use crate::value::{Builtin, Object, SessionMethod, Value};

/// Runtime failure inside a statement.
#[derive(Debug)]
struct Thrown {
	name: &'static str,
	message: String,
}

impl Thrown {
	fn reference(message: impl Into<String>) -> Self {
		Self {
			name: "ReferenceError",
			message: message.into(),
		}
	}

	fn type_error(message: impl Into<String>) -> Self {
		Self {
			name: "TypeError",
			message: message.into(),
		}
	}

	fn recursion() -> Self {
		Self {
			name: "InternalError",
			message: "too much recursion".to_string(),
		}
	}

	fn error(message: impl Into<String>) -> Self {
		Self {
			name: "Error",
			message: message.into(),
		}
	}
}

type Completion = Result<Value, Thrown>;

/// Expression nesting allowed across a statement and every script it loads.
const MAX_EVAL_DEPTH: usize = 256;

/// Scripts loading scripts may nest this far.
const MAX_LOAD_DEPTH: usize = 16;

/// Evaluates sandbox source against desktop scopes.
///
/// Identifiers resolve against the target scope, then its parent chain,
/// then the session's own name. Code run with [`Target::Session`] can also
/// call the session operations unqualified.
#[derive(Debug, Clone)]
pub struct Interpreter {
	desktop: Arc<Desktop>,
}

impl Interpreter {
	pub fn new(desktop: Arc<Desktop>) -> Self {
		Self { desktop }
	}

	fn run(&self, source: &str, this: Arc<Object>, session_target: bool, repl: &mut dyn Repl) -> Evaluation {
		self.run_nested(source, this, session_target, repl, 0, 0)
	}

	fn run_nested(
		&self,
		source: &str,
		this: Arc<Object>,
		session_target: bool,
		repl: &mut dyn Repl,
		depth: usize,
		loads: usize,
	) -> Evaluation {
		let statements = match parse(source) {
			Ok(statements) => statements,
			Err(ParseError::Incomplete(message)) => {
				trace!(target = "rrepl.sandbox", %message, "incomplete input");
				return Evaluation::Incomplete(Diagnostic::new("SyntaxError", message));
			}
			Err(ParseError::Invalid { message, line }) => {
				return Evaluation::Failed(Diagnostic::new("SyntaxError", message).with_stack(frame(line)));
			}
		};
		let mut frame_state = Frame {
			desktop: &self.desktop,
			interpreter: self,
			this,
			session_target,
			repl,
			depth,
			loads,
		};
		match frame_state.statements(&statements) {
			Ok(Value::Undefined) => Evaluation::Completed(None),
			Ok(value) => Evaluation::Completed(Some(value.render())),
			Err((thrown, line)) => {
				debug!(target = "rrepl.sandbox", error = thrown.name, message = %thrown.message, "evaluation failed");
				Evaluation::Failed(Diagnostic::new(thrown.name, thrown.message).with_stack(frame(line)))
			}
		}
	}
}

fn frame(line: usize) -> String {
	format!("@<input>:{line}")
}

impl Evaluator for Interpreter {
	fn evaluate(&self, code: &str, target: Target, repl: &mut dyn Repl) -> Evaluation {
		let (scope, session_target) = match target {
			Target::Scope(scope) => (scope, false),
			Target::Session => (repl.work_scope(), true),
		};
		match as_object(scope) {
			Some(this) => self.run(code, this, session_target, repl),
			None => Evaluation::Failed(Diagnostic::new("TypeError", "scope is not part of the desktop")),
		}
	}
}

fn as_object(scope: ScopeRef) -> Option<Arc<Object>> {
	scope.downcast_arc::<Object>().ok()
}

struct Frame<'a> {
	desktop: &'a Arc<Desktop>,
	interpreter: &'a Interpreter,
	this: Arc<Object>,
	session_target: bool,
	repl: &'a mut dyn Repl,
	depth: usize,
	/// Scripts loaded around this one.
	loads: usize,
}

impl Frame<'_> {
	fn statements(&mut self, statements: &[Stmt]) -> Result<Value, (Thrown, usize)> {
		let mut last = Value::Undefined;
		for statement in statements {
			last = self.expr(&statement.expr).map_err(|thrown| (thrown, statement.line))?;
		}
		Ok(last)
	}

	fn expr(&mut self, expr: &Expr) -> Completion {
		if self.depth >= MAX_EVAL_DEPTH {
			return Err(Thrown::recursion());
		}
		self.depth += 1;
		let completion = self.eval(expr);
		self.depth -= 1;
		completion
	}

	fn eval(&mut self, expr: &Expr) -> Completion {
		match expr {
			Expr::Number(n) => Ok(Value::Number(*n)),
			Expr::Str(s) => Ok(Value::Str(s.clone())),
			Expr::Bool(b) => Ok(Value::Bool(*b)),
			Expr::Null => Ok(Value::Null),
			Expr::Undefined => Ok(Value::Undefined),
			Expr::This => Ok(Value::Object(self.this.clone())),
			Expr::Ident(name) => self.resolve(name),
			Expr::Array(items) => {
				let values = items.iter().map(|item| self.expr(item)).collect::<Result<Vec<_>, _>>()?;
				Ok(Value::Object(Object::array(values, Some(&self.this))))
			}
			Expr::Object(entries) => {
				let object = Object::new("Object", Some(&self.this));
				for (key, value) in entries {
					let value = self.expr(value)?;
					object.set(key, value);
				}
				Ok(Value::Object(object))
			}
			Expr::Member(target, name) => {
				let target = self.expr(target)?;
				self.member(&target, name)
			}
			Expr::Index(target, index) => {
				let target = self.expr(target)?;
				let index = self.expr(index)?;
				self.member(&target, &index.render())
			}
			Expr::Call(callee, args) => {
				let callee = self.expr(callee)?;
				let args = args.iter().map(|arg| self.expr(arg)).collect::<Result<Vec<_>, _>>()?;
				self.call(&callee, args)
			}
			Expr::Unary(op, operand) => {
				let value = self.expr(operand)?;
				Ok(match op {
					UnaryOp::Neg => Value::Number(-number(&value)),
					UnaryOp::Not => Value::Bool(!value.truthy()),
				})
			}
			Expr::Binary(BinaryOp::And, lhs, rhs) => {
				let left = self.expr(lhs)?;
				if left.truthy() { self.expr(rhs) } else { Ok(left) }
			}
			Expr::Binary(BinaryOp::Or, lhs, rhs) => {
				let left = self.expr(lhs)?;
				if left.truthy() { Ok(left) } else { self.expr(rhs) }
			}
			Expr::Binary(op, lhs, rhs) => {
				let left = self.expr(lhs)?;
				let right = self.expr(rhs)?;
				Ok(binary(*op, &left, &right))
			}
			Expr::Assign(target, value) => {
				let value = self.expr(value)?;
				self.assign(target, value.clone())?;
				Ok(value)
			}
		}
	}

	fn resolve(&self, name: &str) -> Completion {
		if let Some(value) = self.this.lookup(name) {
			return Ok(value);
		}
		if name == self.repl.name() {
			return Ok(Value::Session(rrepl::SessionHandle::new(self.repl.id())));
		}
		if self.session_target {
			if let Some(method) = SessionMethod::from_name(name) {
				return Ok(Value::Method(rrepl::SessionHandle::new(self.repl.id()), method));
			}
		}
		Err(Thrown::reference(format!("{name} is not defined")))
	}

	fn member(&self, target: &Value, name: &str) -> Completion {
		match target {
			Value::Object(object) => match name {
				"length" if object.is_array() => Ok(Value::Number(object.len() as f64)),
				_ => Ok(object.get(name).unwrap_or(Value::Undefined)),
			},
			Value::Str(s) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
			Value::Session(handle) => match SessionMethod::from_name(name) {
				Some(method) => Ok(Value::Method(*handle, method)),
				None if name == "name" && handle.id == self.repl.id() => Ok(Value::Str(self.repl.name().to_string())),
				None => Ok(Value::Undefined),
			},
			Value::Undefined | Value::Null => Err(Thrown::type_error(format!(
				"{} has no properties",
				target.render()
			))),
			_ => Ok(Value::Undefined),
		}
	}

	fn assign(&mut self, target: &Expr, value: Value) -> Result<(), Thrown> {
		match target {
			Expr::Ident(name) => {
				self.this.set(name, value);
				Ok(())
			}
			Expr::Member(object, name) => self.assign_property(object, name, value),
			Expr::Index(object, index) => {
				let key = self.expr(index)?.render();
				self.assign_property(object, &key, value)
			}
			_ => Err(Thrown::error("invalid assignment target")),
		}
	}

	fn assign_property(&mut self, object: &Expr, name: &str, value: Value) -> Result<(), Thrown> {
		match self.expr(object)? {
			Value::Object(object) => {
				object.set(name, value);
				Ok(())
			}
			other => Err(Thrown::type_error(format!(
				"cannot set property {name} of {}",
				other.render()
			))),
		}
	}

	fn call(&mut self, callee: &Value, args: Vec<Value>) -> Completion {
		match callee {
			Value::Method(handle, method) if handle.id == self.repl.id() => self.session_call(*method, args),
			Value::Method(..) => Err(Thrown::type_error("cannot call into another session")),
			Value::Builtin(builtin) => self.builtin_call(*builtin, args),
			other => Err(Thrown::type_error(format!("{} is not a function", other.render()))),
		}
	}

	fn builtin_call(&mut self, builtin: Builtin, args: Vec<Value>) -> Completion {
		match builtin {
			Builtin::Open => {
				let name = string_arg(&args, 0, "open")?;
				let title = args.get(1).map(Value::render).unwrap_or_else(|| name.clone());
				Ok(Value::Object(self.desktop.open(&name, &title)))
			}
			Builtin::Close => {
				let name = match args.first() {
					Some(Value::Object(window)) => self.window_name(window),
					Some(other) => Some(other.render()),
					None => None,
				};
				let closed = name.is_some_and(|name| self.desktop.close(&name));
				Ok(Value::Bool(closed))
			}
		}
	}

	fn window_name(&self, window: &Arc<Object>) -> Option<String> {
		let root = self.desktop.root();
		root.keys()
			.into_iter()
			.find(|key| matches!(root.get(key), Some(Value::Object(o)) if Arc::ptr_eq(&o, window)))
	}

	fn session_call(&mut self, method: SessionMethod, args: Vec<Value>) -> Completion {
		let repl = &mut *self.repl;
		let value = match method {
			SessionMethod::Print => {
				let text = args.first().map(Value::render).unwrap_or_default();
				let newline = args.get(1).is_none_or(Value::truthy);
				repl.print(&text, newline);
				Value::Undefined
			}
			SessionMethod::Setenv => {
				let name = string_arg(&args, 0, "setenv")?;
				let value = args.get(1).cloned().unwrap_or(Value::Undefined);
				Value::from_json(&repl.setenv(&name, value.to_json()))
			}
			SessionMethod::Getenv => {
				let name = string_arg(&args, 0, "getenv")?;
				repl.getenv(&name).map(|v| Value::from_json(&v)).unwrap_or(Value::Undefined)
			}
			SessionMethod::Pushenv | SessionMethod::Popenv => {
				let names: Vec<String> = args.iter().map(Value::render).collect();
				let names: Vec<&str> = names.iter().map(String::as_str).collect();
				let result = if method == SessionMethod::Pushenv {
					repl.pushenv(&names)
				} else {
					repl.popenv(&names)
				};
				result.map(|v| Value::from_json(&v)).unwrap_or(Value::Undefined)
			}
			SessionMethod::Load => {
				let url = string_arg(&args, 0, "load")?;
				if self.loads >= MAX_LOAD_DEPTH {
					return Err(Thrown::recursion());
				}
				let source = repl.fetch_script(&url).map_err(|err| Thrown::error(err.to_string()))?;
				let scope = match args.get(1) {
					Some(Value::Object(object)) => object.clone(),
					_ => self.this.clone(),
				};
				return match self.interpreter.run_nested(&source, scope, false, &mut *self.repl, self.depth, self.loads + 1) {
					Evaluation::Completed(_) => Ok(Value::Undefined),
					Evaluation::Incomplete(diagnostic) | Evaluation::Failed(diagnostic) => Err(Thrown {
						name: "Error",
						message: format!("{url}: {diagnostic}"),
					}),
				};
			}
			SessionMethod::Enter => {
				let scope = object_arg(&args, 0, "enter")?;
				scope_value(repl.enter(scope))
			}
			SessionMethod::Back => repl.back().map(scope_value).unwrap_or(Value::Undefined),
			SessionMethod::Home => scope_value(repl.home()),
			SessionMethod::Quit => {
				repl.quit();
				Value::Undefined
			}
			SessionMethod::Rename => {
				let name = string_arg(&args, 0, "rename")?;
				repl.rename(&name);
				Value::Undefined
			}
			SessionMethod::Inspect => {
				let scope = object_arg(&args, 0, "inspect")?;
				let depth = args.get(1).map(|v| number(v).max(0.0) as usize).unwrap_or(0);
				let name = args
					.get(2)
					.map(Value::render)
					.unwrap_or_else(|| format!("<{}>", args[0].type_name()));
				repl.inspect(&scope, depth, &name);
				Value::Undefined
			}
			SessionMethod::Look => {
				repl.look();
				Value::Undefined
			}
			SessionMethod::WhereAmI => {
				repl.where_am_i();
				Value::Undefined
			}
			SessionMethod::Search => {
				let criteria = string_arg(&args, 0, "search")?;
				match args.get(1) {
					Some(Value::Object(object)) => {
						let scope: ScopeRef = object.clone();
						repl.search(&criteria, Some(&scope));
					}
					_ => repl.search(&criteria, None),
				}
				Value::Undefined
			}
			SessionMethod::Doc => {
				let topic = match args.first() {
					Some(Value::Method(_, method)) => method.name().to_string(),
					Some(Value::Builtin(builtin)) => builtin.name().to_string(),
					Some(other) => other.render(),
					None => "doc".to_string(),
				};
				repl.doc(&topic);
				Value::Undefined
			}
		};
		Ok(value)
	}
}

fn scope_value(scope: ScopeRef) -> Value {
	as_object(scope).map(Value::Object).unwrap_or(Value::Undefined)
}

fn string_arg(args: &[Value], index: usize, function: &str) -> Result<String, Thrown> {
	match args.get(index) {
		Some(Value::Undefined) | None => Err(Thrown::type_error(format!(
			"{function}: argument {} is required",
			index + 1
		))),
		Some(value) => Ok(value.render()),
	}
}

fn object_arg(args: &[Value], index: usize, function: &str) -> Result<ScopeRef, Thrown> {
	match args.get(index) {
		Some(Value::Object(object)) => Ok(object.clone()),
		Some(other) => Err(Thrown::type_error(format!(
			"{function}: {} is not an object",
			other.render()
		))),
		None => Err(Thrown::type_error(format!("{function}: argument {} is required", index + 1))),
	}
}

fn number(value: &Value) -> f64 {
	match value {
		Value::Number(n) => *n,
		Value::Bool(true) => 1.0,
		Value::Bool(false) | Value::Null => 0.0,
		Value::Str(s) if s.trim().is_empty() => 0.0,
		Value::Str(s) => s.trim().parse().unwrap_or(f64::NAN),
		_ => f64::NAN,
	}
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
	match op {
		BinaryOp::Add => match (left, right) {
			(Value::Str(_), _) | (_, Value::Str(_)) => Value::Str(format!("{}{}", left.render(), right.render())),
			_ => Value::Number(number(left) + number(right)),
		},
		BinaryOp::Sub => Value::Number(number(left) - number(right)),
		BinaryOp::Mul => Value::Number(number(left) * number(right)),
		BinaryOp::Div => Value::Number(number(left) / number(right)),
		BinaryOp::Rem => Value::Number(number(left) % number(right)),
		BinaryOp::Eq => Value::Bool(left.equals(right)),
		BinaryOp::NotEq => Value::Bool(!left.equals(right)),
		BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
			let ordering = match (left, right) {
				(Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
				_ => number(left).partial_cmp(&number(right)),
			};
			let Some(ordering) = ordering else {
				return Value::Bool(false);
			};
			Value::Bool(match op {
				BinaryOp::Lt => ordering.is_lt(),
				BinaryOp::LtEq => ordering.is_le(),
				BinaryOp::Gt => ordering.is_gt(),
				_ => ordering.is_ge(),
			})
		}
		BinaryOp::And | BinaryOp::Or => Value::Undefined,
	}
}
