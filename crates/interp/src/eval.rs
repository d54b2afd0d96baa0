//! The interpreter loop: one `Interpreter` per core (§4.3, §5). `process`
//! walks the program one statement at a time; `get_expression_value`
//! walks an `Expr` tree; the two are mutually recursive because a
//! statement's operands are expressions and an expression can itself
//! invoke a function, which runs more statements.
//!
//! Nothing in this module touches a heap, a string or another core
//! directly except through `meshrt_core`'s allocator traits and
//! `meshrt_mailbox::CoreCtrl::call` — the one door out to the host.

use meshrt_core::{
    FirstFitHeap, HeapAllocator, HeapPtr, RuntimeError, StackAllocator, StackRegion, SymbolTable,
    Value, gc as gc_heap,
};
use meshrt_mailbox::{CoreHandle, MailboxRequest, MailboxResponse};

use crate::arithmetic::{self, ArithOutcome};
use crate::array;
use crate::expr::{ArgBinding, Expr};
use crate::program::{Program, Stmt};

/// `fnLevel`'s ceiling (§3, §4.3) — re-exported from `meshrt-core` so
/// callers don't need to depend on it directly just to read the bound.
pub use meshrt_core::MAX_CALL_STACK_DEPTH;

const SYMBOL_TABLE_CAPACITY: usize = 256;
const LOCAL_HEAP_SIZE: u32 = 64 * 1024;
const LOCAL_STACK_SIZE: u32 = 16 * 1024;

/// What a single statement does to control flow.
enum Flow {
    Next,
    Jump(usize),
    Return(Option<Value>),
    Stop,
}

/// How a `run` (top-level program body, or one function call) ended.
#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    Stopped,
    Returned(Option<Value>),
}

/// One core's interpreter state. `num_active_cores`/`core_id` are read by
/// `SEND`/`RECV`/`BCAST`/`REDUCTION` to address other cores; the mailbox
/// handle is this core's only channel to the host.
pub struct Interpreter {
    pub core_id: u32,
    pub num_active_cores: u32,
    pub fn_level: u8,
    program: Program,
    symbols: SymbolTable,
    heap: FirstFitHeap,
    stack: StackRegion,
    mailbox: CoreHandle,
}

impl Interpreter {
    pub fn new(program: Program, core_id: u32, num_active_cores: u32, mailbox: CoreHandle) -> Self {
        Self {
            core_id,
            num_active_cores,
            fn_level: 0,
            program,
            symbols: SymbolTable::new(SYMBOL_TABLE_CAPACITY),
            heap: FirstFitHeap::new(LOCAL_HEAP_SIZE),
            stack: StackRegion::new(LOCAL_STACK_SIZE),
            mailbox,
        }
    }

    /// Run the whole program from the top, returning once the core has
    /// executed `STOP`, fallen off the end, or been told by the host to
    /// halt (`CoreCtrl::core_run() == false`).
    pub fn run_program(&mut self) -> Result<(), RuntimeError> {
        let result = self.run(0);
        if let Err(err) = result {
            // §7: a core that hits a fatal error reports it (command 3)
            // and then dies — it never propagates the error to another
            // core or aborts the mesh itself.
            meshrt_core::set_runtime_error(err);
            self.mailbox.call(MailboxRequest::Error(err));
            self.mailbox.stop();
            #[cfg(feature = "diagnostics")]
            crate::diagnostics::forget(self.core_id);
            return Err(err);
        }
        self.mailbox.stop();
        #[cfg(feature = "diagnostics")]
        crate::diagnostics::forget(self.core_id);
        Ok(())
    }

    /// Execute statements starting at `start_ip` until a `Return`/
    /// `ReturnExp`, a `STOP`, falling off the end of the program, or the
    /// host halting this core.
    fn run(&mut self, start_ip: usize) -> Result<RunOutcome, RuntimeError> {
        let mut ip = start_ip;
        loop {
            if !self.mailbox.core_run() {
                return Ok(RunOutcome::Stopped);
            }
            let Some(stmt) = self.program.get(ip).cloned() else {
                return Ok(RunOutcome::Returned(None));
            };
            #[cfg(feature = "trace-opcodes")]
            tracing::trace!(core = self.core_id, ip, ?stmt, "exec");
            #[cfg(feature = "diagnostics")]
            crate::diagnostics::record(
                self.core_id,
                crate::diagnostics::CoreSnapshot { ip, fn_level: self.fn_level },
            );
            match self.execute(&stmt, ip)? {
                Flow::Next => ip += 1,
                Flow::Jump(target) => ip = target,
                Flow::Return(v) => return Ok(RunOutcome::Returned(v)),
                Flow::Stop => return Ok(RunOutcome::Stopped),
            }
        }
    }

    /// Bind arguments by alias, run the callee body, unwind the frame
    /// (§4.1 `bind_alias`, §4.3 `clearVariablesToLevel`). Shared by
    /// `FNCALL`-as-statement and `Expr::Call`.
    fn call_function(
        &mut self,
        addr: usize,
        args: &[ArgBinding],
    ) -> Result<Option<Value>, RuntimeError> {
        let caller_level = self.fn_level;
        let new_level = caller_level
            .checked_add(1)
            .filter(|&l| l <= MAX_CALL_STACK_DEPTH)
            .ok_or(RuntimeError::CallStackDepthExceeded)?;

        for binding in args {
            self.symbols
                .bind_alias(binding.callee_id, binding.caller_id, new_level)?;
        }

        // §4.2: a call frame's stack-region temporaries (if the callee's
        // expressions need any) are released in bulk by watermark on
        // return, same as the symbol table's level-scoped clear.
        let stack_watermark = self.stack.watermark();
        self.fn_level = new_level;
        let outcome = self.run(addr);
        self.stack.clear_to_watermark(stack_watermark);
        self.symbols.clear_to_level(new_level);
        self.fn_level = caller_level;

        match outcome? {
            RunOutcome::Returned(v) => Ok(v),
            RunOutcome::Stopped => Ok(None),
        }
    }

    fn execute(&mut self, stmt: &Stmt, ip: usize) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Let { id, no_alias, value } => {
                if !*no_alias {
                    if let Expr::Symbol(src_id) = value {
                        let slot = self.symbols.resolve(*src_id, self.fn_level, true)?;
                        let src_val = self.symbols.get(slot).value;
                        let dest = self.symbols.resolve(*id, self.fn_level, false)?;
                        self.symbols.get_mut(dest).value = src_val;
                        return Ok(Flow::Next);
                    }
                }
                let v = self.get_expression_value(value)?;
                let dest = self.symbols.resolve(*id, self.fn_level, false)?;
                self.symbols.get_mut(dest).value = v;
                Ok(Flow::Next)
            }

            Stmt::ArraySet { id, indices, value } => {
                let idx = self.eval_indices(indices)?;
                let v = self.get_expression_value(value)?;
                // Array storage is row-major i32 (§3); INT/BOOLEAN are the
                // only element types the grammar stores into one.
                let int_v = match v {
                    Value::Int(i) => i as i32,
                    Value::Bool(b) => b as i32,
                    _ => 0,
                };
                let slot = self.symbols.resolve(*id, self.fn_level, true)?;
                let ptr = self.array_ptr(slot)?;
                let new_ptr = array::array_set(&mut self.heap, ptr, &idx, int_v)?;
                self.symbols.get_mut(slot).value = Value::Array(new_ptr);
                Ok(Flow::Next)
            }

            Stmt::DimArray { id, dims, shared, extendable } => {
                let dims = self.eval_dims(dims)?;
                let ptr = if *shared {
                    // The shared heap lives on the host in this
                    // in-process mesh; a local simulation still needs
                    // somewhere to put it, so shared arrays are allocated
                    // from this core's own heap too — cross-core
                    // visibility of SHARED arrays is a host-level concern
                    // (`meshrt-host`'s shared-region bookkeeping), not
                    // this allocator's.
                    array::dim_array(&mut self.heap, dims, *extendable)?
                } else {
                    array::dim_array(&mut self.heap, dims, *extendable)?
                };
                let slot = self.symbols.resolve(*id, self.fn_level, false)?;
                self.symbols.get_mut(slot).value = Value::Array(ptr);
                Ok(Flow::Next)
            }

            Stmt::If { cond, else_target } => {
                if self.truthy(cond)? {
                    Ok(Flow::Next)
                } else {
                    Ok(Flow::Jump(*else_target))
                }
            }

            Stmt::IfElse { cond, else_target, end_target } => {
                if self.truthy(cond)? {
                    Ok(Flow::Next)
                } else {
                    let _ = end_target;
                    Ok(Flow::Jump(*else_target))
                }
            }

            Stmt::For { index_var, var, array, end_target } => {
                let index_slot = self.symbols.resolve(*index_var, self.fn_level, false)?;
                let index = match self.symbols.get(index_slot).value {
                    Value::Int(i) if i >= 0 => i as u32,
                    _ => 0,
                };
                let array_val = self.get_expression_value(array)?;
                let ptr = match array_val {
                    Value::Array(ptr) => ptr,
                    _ => return Err(RuntimeError::ArrIndexExceedSize),
                };
                if index >= array::array_len(&self.heap, ptr) {
                    return Ok(Flow::Jump(*end_target + 1));
                }
                let element = array::array_get(&self.heap, ptr, &[index])?;
                let var_slot = self.symbols.resolve(*var, self.fn_level, false)?;
                self.symbols.get_mut(var_slot).value = element;
                Ok(Flow::Next)
            }

            Stmt::NextFor { for_stmt } => {
                let Stmt::For { index_var, .. } = self
                    .program
                    .get(*for_stmt)
                    .expect("NextFor must target a For statement")
                    .clone()
                else {
                    unreachable!("NextFor target is always a For statement");
                };
                let index_slot = self.symbols.resolve(index_var, self.fn_level, false)?;
                let next = match self.symbols.get(index_slot).value {
                    Value::Int(i) => i + 1,
                    _ => 1,
                };
                self.symbols.get_mut(index_slot).value = Value::Int(next);
                Ok(Flow::Jump(*for_stmt))
            }

            Stmt::Goto(target) => Ok(Flow::Jump(*target)),

            Stmt::FnCall { addr, args } => {
                self.call_function(*addr, args)?;
                Ok(Flow::Next)
            }

            Stmt::Return => Ok(Flow::Return(None)),
            Stmt::ReturnExp(expr) => {
                let v = self.get_expression_value(expr)?;
                Ok(Flow::Return(Some(v)))
            }

            Stmt::Stop => Ok(Flow::Stop),

            Stmt::Input { id } => {
                let resp = self.mailbox.call(MailboxRequest::Input);
                let v = match resp {
                    MailboxResponse::Line(line) => parse_numeric_line(&line),
                    MailboxResponse::Value(v) => v,
                    MailboxResponse::Ack => Value::None,
                };
                let slot = self.symbols.resolve(*id, self.fn_level, false)?;
                self.symbols.get_mut(slot).value = v;
                Ok(Flow::Next)
            }

            Stmt::InputString { id } => {
                let resp = self.mailbox.call(MailboxRequest::InputString);
                let v = match resp {
                    MailboxResponse::Value(v) => v,
                    _ => Value::None,
                };
                let slot = self.symbols.resolve(*id, self.fn_level, false)?;
                self.symbols.get_mut(slot).value = v;
                Ok(Flow::Next)
            }

            Stmt::Send { target, value } => {
                let target = self.expect_global_id(target)?;
                let v = self.get_expression_value(value)?;
                self.mailbox.call(MailboxRequest::Send { target, value: v });
                Ok(Flow::Next)
            }

            Stmt::Recv { source, dest } => {
                let source = self.expect_global_id(source)?;
                let resp = self.mailbox.call(MailboxRequest::Recv { source });
                let v = value_from_response(resp);
                let slot = self.symbols.resolve(*dest, self.fn_level, false)?;
                self.symbols.get_mut(slot).value = v;
                Ok(Flow::Next)
            }

            Stmt::SendRecv { target, value, dest } => {
                let target_id = self.expect_global_id(target)?;
                let v = self.get_expression_value(value)?;
                let resp = self.mailbox.call(MailboxRequest::SendRecv {
                    target: target_id,
                    value: v,
                });
                let recvd = value_from_response(resp);
                let slot = self.symbols.resolve(*dest, self.fn_level, false)?;
                self.symbols.get_mut(slot).value = recvd;
                Ok(Flow::Next)
            }

            Stmt::Bcast { source, value, dest } => {
                let source_id = self.expect_global_id(source)?;
                let payload = match value {
                    Some(expr) => Some(self.get_expression_value(expr)?),
                    None => None,
                };
                let resp = self.mailbox.call(MailboxRequest::Bcast {
                    source: source_id,
                    value: payload,
                });
                let v = value_from_response(resp);
                let slot = self.symbols.resolve(*dest, self.fn_level, false)?;
                self.symbols.get_mut(slot).value = v;
                Ok(Flow::Next)
            }

            Stmt::Reduction { op, value, dest } => {
                let v = self.get_expression_value(value)?;
                let resp = self
                    .mailbox
                    .call(MailboxRequest::Reduce { op: *op, value: v });
                let reduced = value_from_response(resp);
                let slot = self.symbols.resolve(*dest, self.fn_level, false)?;
                self.symbols.get_mut(slot).value = reduced;
                Ok(Flow::Next)
            }

            Stmt::Sync => {
                self.mailbox.call(MailboxRequest::Sync);
                Ok(Flow::Next)
            }

            Stmt::Native { id, args, dest } => {
                let v = self.eval_native(*id, args)?;
                if let Some(dest) = dest {
                    let slot = self.symbols.resolve(*dest, self.fn_level, false)?;
                    self.symbols.get_mut(slot).value = v;
                }
                Ok(Flow::Next)
            }

            Stmt::Free { id } => {
                let slot = self.symbols.resolve(*id, self.fn_level, true)?;
                if let Some(ptr) = self.symbols.get(slot).value.pointer_identity() {
                    self.heap.heap_free(ptr);
                }
                Ok(Flow::Next)
            }

            Stmt::Gc => {
                gc_heap(&self.symbols, &mut self.heap);
                Ok(Flow::Next)
            }

            Stmt::Print(expr) => {
                let v = self.get_expression_value(expr)?;
                self.mailbox.call(MailboxRequest::Display(v));
                Ok(Flow::Next)
            }

            Stmt::Label => {
                let _ = ip;
                Ok(Flow::Next)
            }
        }
    }

    /// `get_expression_value`: recursive-descent evaluation of a parsed
    /// expression tree (§4.3). Recurses into `call_function` for nested
    /// calls, which in turn runs more statements — the mutual recursion
    /// with `execute`/`run`.
    fn get_expression_value(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        if let Some(v) = expr.literal_value() {
            return Ok(v);
        }
        match expr {
            Expr::Symbol(id) => {
                let slot = self.symbols.resolve(*id, self.fn_level, true)?;
                Ok(self.symbols.get(slot).value)
            }
            Expr::ArrayAccess(id, indices) => {
                let idx = self.eval_indices(indices)?;
                let slot = self.symbols.resolve(*id, self.fn_level, true)?;
                let ptr = self.array_ptr(slot)?;
                array::array_get(&self.heap, ptr, &idx)
            }
            Expr::Call(addr, args) => {
                let v = self.call_function(*addr, args)?;
                Ok(v.unwrap_or(Value::None))
            }
            Expr::Un(op, inner) => {
                let v = self.get_expression_value(inner)?;
                arithmetic::apply_unop(*op, v)
            }
            Expr::Bin(op, lhs, rhs) => {
                let l = self.get_expression_value(lhs)?;
                let r = self.get_expression_value(rhs)?;
                match arithmetic::apply_binop(*op, l, r)? {
                    ArithOutcome::Value(v) => Ok(v),
                    ArithOutcome::NeedsConcat => {
                        match self.mailbox.call(MailboxRequest::Concat(l, r)) {
                            MailboxResponse::Value(v) => Ok(v),
                            _ => Ok(Value::None),
                        }
                    }
                }
            }
            Expr::CoreId => Ok(Value::Int(self.core_id as i64)),
            Expr::NumCores => Ok(Value::Int(self.num_active_cores as i64)),
            Expr::Len(inner) => match self.get_expression_value(inner)? {
                Value::Array(ptr) => Ok(Value::Int(array::array_len(&self.heap, ptr) as i64)),
                _ => Err(RuntimeError::ArrIndexExceedSize),
            },
            Expr::Maths(op, inner) => {
                let v = self.get_expression_value(inner)?;
                let operand = match v {
                    Value::Int(i) => i as f64,
                    Value::Real(r) => r,
                    Value::Bool(b) => b as i64 as f64,
                    _ => 0.0,
                };
                match self.mailbox.call(MailboxRequest::Math { op: *op, operand }) {
                    MailboxResponse::Value(v) => Ok(v),
                    _ => Ok(Value::None),
                }
            }
            Expr::ArrayLit(elems, repeat) => {
                let mut values = Vec::with_capacity(elems.len());
                for e in elems {
                    let v = self.get_expression_value(e)?;
                    values.push(match v {
                        Value::Int(i) => i as i32,
                        Value::Bool(b) => b as i32,
                        _ => 0,
                    });
                }
                let reps = match repeat {
                    Some(e) => match self.get_expression_value(e)? {
                        Value::Int(i) if i >= 0 => i as usize,
                        _ => 1,
                    },
                    None => 1,
                };
                let total = (values.len() * reps).max(1);
                let ptr = array::dim_array(&mut self.heap, vec![total as u32], false)?;
                let mut idx = 0u32;
                for _ in 0..reps {
                    for &v in &values {
                        array::array_set(&mut self.heap, ptr, &[idx], v)?;
                        idx += 1;
                    }
                }
                Ok(Value::Array(ptr))
            }
            Expr::Let(id, value) => {
                let v = self.get_expression_value(value)?;
                let slot = self.symbols.resolve(*id, self.fn_level, false)?;
                self.symbols.get_mut(slot).value = v;
                Ok(v)
            }
            Expr::Native(id, args) => self.eval_native(*id, args),
            Expr::Int(_) | Expr::Real(_) | Expr::Bool(_) | Expr::Str(_) | Expr::None => {
                unreachable!("literal_value handles every constant variant")
            }
        }
    }

    /// Shared by `Stmt::Native` and `Expr::Native` (§4.3's `NATIVE`
    /// opcode): this runtime has no built-in native routines, so arguments
    /// are evaluated for their side effects (e.g. nested calls) and the
    /// result is always NONE.
    fn eval_native(&mut self, _id: u32, args: &[Expr]) -> Result<Value, RuntimeError> {
        for a in args {
            self.get_expression_value(a)?;
        }
        Ok(Value::None)
    }

    fn truthy(&mut self, expr: &Expr) -> Result<bool, RuntimeError> {
        match self.get_expression_value(expr)? {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::Real(r) => Ok(r != 0.0),
            Value::None => Ok(false),
            _ => Ok(true),
        }
    }

    fn eval_indices(&mut self, indices: &[Expr]) -> Result<Vec<u32>, RuntimeError> {
        let mut out = Vec::with_capacity(indices.len());
        for e in indices {
            match self.get_expression_value(e)? {
                Value::Int(i) if i >= 0 => out.push(i as u32),
                Value::Int(_) => return Err(RuntimeError::NegArrIndex),
                _ => return Err(RuntimeError::NegArrIndex),
            }
        }
        Ok(out)
    }

    fn eval_dims(&mut self, dims: &[Expr]) -> Result<Vec<u32>, RuntimeError> {
        self.eval_indices(dims)
    }

    fn array_ptr(&self, slot: usize) -> Result<HeapPtr, RuntimeError> {
        match self.symbols.get(slot).value {
            Value::Array(p) => Ok(p),
            _ => Err(RuntimeError::ArrIndexExceedSize),
        }
    }

    fn expect_global_id(&mut self, expr: &Expr) -> Result<u32, RuntimeError> {
        match self.get_expression_value(expr)? {
            Value::Int(i) if i >= 0 => Ok(i as u32),
            _ => Err(RuntimeError::NegArrIndex),
        }
    }
}

fn value_from_response(resp: MailboxResponse) -> Value {
    match resp {
        MailboxResponse::Value(v) => v,
        MailboxResponse::Line(_) | MailboxResponse::Ack => Value::None,
    }
}

fn parse_numeric_line(line: &str) -> Value {
    let trimmed = line.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(r) = trimmed.parse::<f64>() {
        Value::Real(r)
    } else {
        Value::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BinOp;
    use meshrt_mailbox::Mesh;

    fn single_core() -> (Interpreter, std::sync::Arc<meshrt_mailbox::CoreCtrl>) {
        let mesh = Mesh::new(1);
        let handle = mesh.core(0).clone();
        (
            Interpreter::new(Program::new(vec![]), 0, 1, handle.clone()),
            handle,
        )
    }

    #[test]
    fn let_binds_a_literal() {
        let (mut interp, _h) = single_core();
        interp.program = Program::new(vec![Stmt::Let {
            id: 1,
            no_alias: true,
            value: Expr::Int(42),
        }]);
        interp.run_program().unwrap();
        let slot = interp.symbols.resolve(1, 0, false).unwrap();
        assert_eq!(interp.symbols.get(slot).value, Value::Int(42));
    }

    #[test]
    fn sum_one_to_ten_via_for_loop_over_an_array() {
        // sum = 0; for i in [1..10]: sum = sum + i
        let stmts = vec![
            /* 0 */ Stmt::Let { id: 100, no_alias: true, value: Expr::Int(0) },
            /* 1 */ Stmt::For {
                index_var: 200,
                var: 1,
                array: Expr::ArrayLit(
                    (1..=10).map(Expr::Int).collect(),
                    None,
                ),
                end_target: 4,
            },
            /* 2 */ Stmt::Let {
                id: 100,
                no_alias: true,
                value: Expr::Bin(
                    BinOp::Add,
                    Box::new(Expr::Symbol(100)),
                    Box::new(Expr::Symbol(1)),
                ),
            },
            /* 3 */ Stmt::NextFor { for_stmt: 1 },
            /* 4 */ Stmt::Label,
            /* 5 */ Stmt::Stop,
        ];
        let (mut interp, _h) = single_core();
        interp.program = Program::new(stmts);
        interp.run_program().unwrap();
        let slot = interp.symbols.resolve(100, 0, false).unwrap();
        assert_eq!(interp.symbols.get(slot).value, Value::Int(55));
    }

    #[test]
    fn for_loop_iterates_a_fixed_array_literal() {
        // for x in [10, 20, 30]: last = x
        let stmts = vec![
            /* 0 */ Stmt::For {
                index_var: 200,
                var: 1,
                array: Expr::ArrayLit(
                    vec![Expr::Int(10), Expr::Int(20), Expr::Int(30)],
                    None,
                ),
                end_target: 2,
            },
            /* 1 */ Stmt::NextFor { for_stmt: 0 },
            /* 2 */ Stmt::Label,
            /* 3 */ Stmt::Stop,
        ];
        let (mut interp, _h) = single_core();
        interp.program = Program::new(stmts);
        interp.run_program().unwrap();
        let slot = interp.symbols.resolve(1, 0, false).unwrap();
        assert_eq!(interp.symbols.get(slot).value, Value::Int(30));
    }

    #[test]
    fn recursive_factorial_returns_to_level_zero() {
        // fact(n): if n <= 1 return 1; else return n * fact(n - 1)
        // symbol ids: n = 1 (param), result-temp = 2
        let stmts = vec![
            /* addr 0: fact entry */
            Stmt::If {
                cond: Expr::Bin(BinOp::Le, Box::new(Expr::Symbol(1)), Box::new(Expr::Int(1))),
                else_target: 3,
            },
            /* 1 */ Stmt::ReturnExp(Expr::Int(1)),
            /* 2 */ Stmt::Goto(6), // unreachable, keeps indices stable
            /* 3 (else branch) */
            Stmt::Let {
                id: 2,
                no_alias: true,
                value: Expr::Bin(BinOp::Sub, Box::new(Expr::Symbol(1)), Box::new(Expr::Int(1))),
            },
            /* 4 */
            Stmt::ReturnExp(Expr::Bin(
                BinOp::Mul,
                Box::new(Expr::Symbol(1)),
                Box::new(Expr::Call(
                    0,
                    vec![ArgBinding { callee_id: 1, caller_id: 2 }],
                )),
            )),
            /* 5 */ Stmt::Stop,
            /* 6 */ Stmt::Stop,
            /* 7: top level — symbol id 50 (distinct from the callee's
               param id 1) holds the initial argument. */
            Stmt::Let {
                id: 50,
                no_alias: true,
                value: Expr::Int(5),
            },
            /* 8 */
            Stmt::Let {
                id: 200,
                no_alias: true,
                value: Expr::Call(0, vec![ArgBinding { callee_id: 1, caller_id: 50 }]),
            },
            /* 9 */ Stmt::Stop,
        ];
        let (mut interp, _h) = single_core();
        interp.program = Program::new(stmts);
        interp.run(7).unwrap();
        let slot = interp.symbols.resolve(200, 0, false).unwrap();
        assert_eq!(interp.symbols.get(slot).value, Value::Int(120));
        assert_eq!(interp.fn_level, 0);
        assert!(interp.symbols.no_frames_above_global());
    }

    #[test]
    fn array_extend_preserves_content_and_grows_length() {
        let stmts = vec![
            Stmt::DimArray { id: 1, dims: vec![Expr::Int(3)], shared: false, extendable: true },
            Stmt::ArraySet { id: 1, indices: vec![Expr::Int(7)], value: Expr::Int(9) },
            Stmt::Stop,
        ];
        let (mut interp, _h) = single_core();
        interp.program = Program::new(stmts);
        interp.run_program().unwrap();
        let slot = interp.symbols.resolve(1, 0, false).unwrap();
        let ptr = match interp.symbols.get(slot).value {
            Value::Array(p) => p,
            _ => panic!("expected array"),
        };
        assert_eq!(array::array_len(&interp.heap, ptr), 8);
        assert_eq!(array::array_get(&interp.heap, ptr, &[7]).unwrap(), Value::Int(9));
    }
}
