//! Code Generator: a single-threaded AST visitor over `pudlc_ast` that calls
//! into `inkwell` to produce SSA values, basic blocks, and function
//! definitions.
//!
//! Shaped like `faxc_gen::llvm::LlvmBackend` — same
//! `context`/`module`/`builder` struct shape and the same
//! `.map_err(|e| CodeGenError::LlvmOperationFailed(format!("...: {}", e)))?`
//! idiom at every fallible `inkwell` call — generalized from a LIR-consuming
//! backend to an AST-consuming one, since this language lowers its typed AST
//! directly to LLVM IR with no separate MIR/LIR stage.

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValue, BasicValueEnum, FloatValue, FunctionValue, IntValue, PointerValue};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};
use rustc_hash::FxHashMap;

use pudlc_ast::{BinOp, Expr, ExprKind, FunctionDef, Item, Stmt, StmtKind, Type, UnOp};
use pudlc_util::Symbol;

use crate::error::{CodeGenError, Result};
use crate::pass::{build_function_pass_manager, OptLevel};

/// One value the typed dialect's variable table can hold: a direct SSA
/// value (a parameter, kept in `args`) or a stack slot (an `alloca`'d
/// declaration, kept in `locals`).
enum Binding<'ctx> {
    Arg(BasicValueEnum<'ctx>),
    Slot(PointerValue<'ctx>, Type),
}

#[derive(Clone, Copy)]
struct FunctionSignature<'ctx> {
    return_type: Type,
    param_types: &'ctx [Type],
}

pub struct Codegen<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    fpm: inkwell::passes::PassManager<FunctionValue<'ctx>>,
    opt_level: OptLevel,

    /// Module-global `funcs`: name → function handle.
    functions: FxHashMap<Symbol, FunctionValue<'ctx>>,
    /// Module-global `func_signatures`: name → declared param/return types,
    /// kept alongside `functions` rather than re-derived from the AST since
    /// the code generator doesn't retain AST references after a function is
    /// emitted.
    signatures: FxHashMap<Symbol, (Vec<Type>, Type)>,

    /// Per-function scope, rebuilt at each `FunctionDef` (typed dialect) or
    /// reused with shadowing (expression dialect's `for`/`var`).
    locals: FxHashMap<Symbol, Binding<'ctx>>,
    current_function: Option<FunctionValue<'ctx>>,

    format_i: Option<PointerValue<'ctx>>,
    format_f: Option<PointerValue<'ctx>>,
    printf_fn: Option<FunctionValue<'ctx>>,

    anon_counter: u32,
}

impl<'ctx> Codegen<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str, opt_level: OptLevel) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();
        let fpm = build_function_pass_manager(opt_level);

        let mut codegen = Codegen {
            context,
            module,
            builder,
            fpm,
            opt_level,
            functions: FxHashMap::default(),
            signatures: FxHashMap::default(),
            locals: FxHashMap::default(),
            current_function: None,
            format_i: None,
            format_f: None,
            printf_fn: None,
            anon_counter: 0,
        };
        codegen.declare_runtime();
        codegen
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Swaps in a fresh, empty module, reinitializing the pass manager along
    /// with it so subsequent REPL items compile into a clean module.
    /// `functions` (bindings local to one LLVM module) are cleared;
    /// `signatures` persists so later items can still type-check
    /// calls to functions defined in a now-discarded module — `lower_call`
    /// re-declares an external stub for those on demand (see
    /// `ensure_function_declared`), matching the reference JIT's
    /// `getFunction` helper.
    pub fn reset_module(&mut self, module_name: &str) {
        self.module = self.context.create_module(module_name);
        self.builder = self.context.create_builder();
        self.fpm = build_function_pass_manager(self.opt_level);
        self.functions.clear();
        self.format_i = None;
        self.format_f = None;
        self.printf_fn = None;
        self.declare_runtime();
    }

    pub fn emit_ir_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn write_object_file(
        &self,
        target_triple: &str,
        path: &std::path::Path,
    ) -> Result<()> {
        inkwell::targets::Target::initialize_all(&inkwell::targets::InitializationConfig::default());
        let triple = inkwell::targets::TargetTriple::create(target_triple);
        let target = inkwell::targets::Target::from_triple(&triple)
            .map_err(|e| CodeGenError::TargetError(e.to_string()))?;
        let target_machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                inkwell::OptimizationLevel::Default,
                inkwell::targets::RelocMode::Default,
                inkwell::targets::CodeModel::Default,
            )
            .ok_or_else(|| CodeGenError::TargetError("no target machine".to_string()))?;
        target_machine
            .write_to_file(&self.module, inkwell::targets::FileType::Object, path)
            .map_err(|e| CodeGenError::EmitError(e.to_string()))
    }

    /// Declares `printf` and the two format-string globals `.formati`/
    /// `.formatf` used by the typed dialect's `print` statement.
    fn declare_runtime(&mut self) {
        let i8_ptr = self.context.ptr_type(AddressSpace::default());
        let printf_ty = self.context.i32_type().fn_type(&[i8_ptr.into()], true);
        let printf_fn = self.module.add_function("printf", printf_ty, Some(Linkage::External));
        self.printf_fn = Some(printf_fn);

        self.format_i = Some(self.make_format_global(".formati", "%d\n\0"));
        self.format_f = Some(self.make_format_global(".formatf", "%f\n\0"));
    }

    fn make_format_global(&mut self, name: &str, text: &str) -> PointerValue<'ctx> {
        let bytes = text.as_bytes();
        let i8_ty = self.context.i8_type();
        let array_ty = i8_ty.array_type(bytes.len() as u32);
        let global = self.module.add_global(array_ty, None, name);
        global.set_linkage(Linkage::Private);
        global.set_constant(true);
        global.set_initializer(&i8_ty.const_array(
            &bytes.iter().map(|b| i8_ty.const_int(*b as u64, false)).collect::<Vec<_>>(),
        ));
        global.as_pointer_value()
    }

    // -- top level --

    pub fn compile_program(&mut self, items: &[Item]) -> std::result::Result<(), Vec<CodeGenError>> {
        let mut errors = Vec::new();
        for item in items {
            if let Err(e) = self.compile_item(item) {
                tracing::error!(%e, "codegen error, skipping remainder of this item");
                errors.push(e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Exposed beyond `compile_program` so the REPL driver can compile one
    /// item at a time between JIT add/remove calls.
    pub fn compile_item(&mut self, item: &Item) -> Result<()> {
        match item {
            Item::FunctionDef(f) => self.compile_function(f).map(|_| ()),
            Item::Extern(proto) => {
                let param_types: Vec<Type> = proto.params.iter().map(|p| p.ty).collect();
                self.declare_function(proto.name, &param_types, Type::Float)?;
                Ok(())
            }
            Item::Prototype(_) => Ok(()),
            Item::TopLevelExpr(expr) => self.compile_top_level_expr(expr).map(|_| ()),
        }
    }

    /// Wraps a bare expression-dialect expression in a synthetic
    /// `__anon_expr` nullary function and compiles it. Public so the REPL
    /// driver can look up the returned function's name
    /// to call it through the JIT immediately after `add_module`.
    pub fn compile_top_level_expr(&mut self, expr: &Expr) -> Result<FunctionValue<'ctx>> {
        self.anon_counter += 1;
        let name = Symbol::intern(&format!("__anon_expr{}", self.anon_counter));
        let f64_ty = self.context.f64_type();
        let fn_ty = f64_ty.fn_type(&[], false);
        let function = self.module.add_function(name.as_str(), fn_ty, None);
        self.signatures.insert(name, (Vec::new(), Type::Float));

        self.locals.clear();
        self.current_function = Some(function);
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let value = self.lower_expr(expr)?;
        self.build_return_value(value.into_float_value().as_basic_value_enum())?;

        self.functions.insert(name, function);
        self.fpm.run_on(&function);
        Ok(function)
    }

    fn declare_function(
        &mut self,
        name: Symbol,
        param_types: &[Type],
        return_type: Type,
    ) -> Result<FunctionValue<'ctx>> {
        let expr_dialect = self.is_expression_dialect(name);
        let llvm_param_types: Vec<_> = param_types
            .iter()
            .map(|ty| {
                if expr_dialect && *ty == Type::Float {
                    self.context.f64_type().into()
                } else {
                    self.basic_type(*ty).into()
                }
            })
            .collect();
        let fn_ty = match return_type {
            Type::Bool => self.context.bool_type().fn_type(&llvm_param_types, false),
            Type::Integer => self.context.i32_type().fn_type(&llvm_param_types, false),
            Type::Float if self.is_expression_dialect(name) => {
                self.context.f64_type().fn_type(&llvm_param_types, false)
            }
            Type::Float => self.context.f32_type().fn_type(&llvm_param_types, false),
            Type::Undefined => return Err(CodeGenError::Internal("undefined return type".into())),
        };
        let function = self.module.add_function(name.as_str(), fn_ty, Some(Linkage::External));
        self.functions.insert(name, function);
        self.signatures.insert(name, (param_types.to_vec(), return_type));
        Ok(function)
    }

    /// Resolves `name` to a callable `FunctionValue` in the *current*
    /// module, declaring an external stub from the persisted `signatures`
    /// table if `name` was defined in a module a prior REPL `reset_module`
    /// already discarded — the JIT links the call back to the original
    /// definition by symbol name at call time.
    fn ensure_function_declared(&mut self, name: Symbol) -> Result<FunctionValue<'ctx>> {
        if let Some(function) = self.functions.get(&name) {
            return Ok(*function);
        }
        let (param_types, return_type) = self
            .signatures
            .get(&name)
            .cloned()
            .ok_or(CodeGenError::UndefinedFunction(name.to_string()))?;
        self.declare_function(name, &param_types, return_type)
    }

    /// Linker thunk: when this module defines `mast` (the typed dialect's
    /// entry point), emits a trivial `main`
    /// that calls it, prints the `i32` result via `printf` followed by a
    /// newline, and returns 0. Returns `false` without touching the
    /// module if `mast` isn't defined here.
    pub fn emit_main_thunk(&mut self) -> Result<bool> {
        let mast_name = Symbol::intern("mast");
        let Some(&mast) = self.functions.get(&mast_name) else {
            return Ok(false);
        };
        let printf_fn = self
            .printf_fn
            .ok_or_else(|| CodeGenError::Internal("printf not declared".into()))?;
        let format_i = self
            .format_i
            .ok_or_else(|| CodeGenError::Internal("format globals not declared".into()))?;

        let i32_ty = self.context.i32_type();
        let main_ty = i32_ty.fn_type(&[], false);
        let main_fn = self.module.add_function("main", main_ty, None);
        let entry = self.context.append_basic_block(main_fn, "entry");
        self.builder.position_at_end(entry);

        let result = self
            .builder
            .build_call(mast, &[], "mast_call")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("mast call: {e}")))?
            .try_as_basic_value()
            .left()
            .ok_or_else(|| CodeGenError::Internal("mast returned no value".into()))?;

        self.builder
            .build_call(printf_fn, &[format_i.into(), result.into()], "printf_call")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("printf call: {e}")))?;

        self.builder
            .build_return(Some(&i32_ty.const_int(0, false)))
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("return: {e}")))?;

        self.fpm.run_on(&main_fn);
        Ok(true)
    }

    /// `declare_function` is only ever reached for an `extern` prototype
    /// (expression-dialect only; the typed dialect has no `extern`) or to
    /// re-declare a function `reset_module` discarded (only the REPL loop
    /// resets modules, and only expression-dialect items flow through it),
    /// so both callers always want the `f64` treatment.
    fn is_expression_dialect(&self, _name: Symbol) -> bool {
        true
    }

    fn compile_function(&mut self, f: &FunctionDef) -> Result<FunctionValue<'ctx>> {
        let param_types: Vec<Type> = f.params.iter().map(|p| p.ty).collect();
        let expr_dialect = f.is_expression_dialect;

        let llvm_param_types: Vec<BasicTypeEnum<'ctx>> = param_types
            .iter()
            .map(|ty| {
                if expr_dialect {
                    self.context.f64_type().into()
                } else {
                    self.basic_type(*ty)
                }
            })
            .collect();
        let metadata: Vec<_> = llvm_param_types.iter().map(|t| (*t).into()).collect();

        let fn_ty = if expr_dialect {
            self.context.f64_type().fn_type(&metadata, false)
        } else {
            match f.return_type {
                Type::Bool => self.context.bool_type().fn_type(&metadata, false),
                Type::Integer => self.context.i32_type().fn_type(&metadata, false),
                Type::Float => self.context.f32_type().fn_type(&metadata, false),
                Type::Undefined => return Err(CodeGenError::Internal("undefined return type".into())),
            }
        };

        let function = self.module.add_function(f.name.as_str(), fn_ty, None);
        for (param, llvm_param) in f.params.iter().zip(function.get_params()) {
            llvm_param.set_name(param.name.as_str());
        }

        self.functions.insert(f.name, function);
        self.signatures.insert(
            f.name,
            (param_types.clone(), if expr_dialect { Type::Float } else { f.return_type }),
        );

        self.locals.clear();
        self.current_function = Some(function);

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        if expr_dialect {
            // Expression-dialect params are entry-block allocas, not raw
            // SSA values, so a later `=` or recursive `var` shadow can
            // rebind them in place.
            for (param, llvm_param) in f.params.iter().zip(function.get_params()) {
                let slot = self.create_entry_alloca(function, param.name.as_str(), Type::Float)?;
                self.store(slot, llvm_param, Type::Float)?;
                self.locals.insert(param.name, Binding::Slot(slot, Type::Float));
            }
        } else {
            for (param, llvm_param) in f.params.iter().zip(function.get_params()) {
                self.locals.insert(param.name, Binding::Arg(llvm_param));
            }
        }

        if expr_dialect {
            let StmtKind::Return(expr) = &f.body.kind else {
                return Err(CodeGenError::Internal(
                    "expression-dialect function body must be a Return".into(),
                ));
            };
            let value = self.lower_expr(expr)?;
            self.build_return_value(value)?;
        } else {
            self.lower_stmt(&f.body)?;
            if self.current_block_is_open() {
                // A typed-dialect function whose body falls off the end
                // without an explicit `return` statement: a default-valued
                // return keeps every block terminated.
                let default = self.default_value(f.return_type)?;
                self.build_return_value(default)?;
            }
        }

        self.fpm.run_on(&function);
        Ok(function)
    }

    // -- typed-dialect statements --

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                for s in stmts {
                    self.lower_stmt(s)?;
                }
                Ok(())
            }
            StmtKind::Assign { name, ty, rhs } => {
                let value = self.lower_expr(rhs)?;
                let value = self.cast_to(value, rhs.ty, *ty)?;
                match self.locals.get(name) {
                    Some(Binding::Slot(slot, _)) => {
                        let slot = *slot;
                        self.store(slot, value, *ty)
                    }
                    _ => {
                        let function = self.current_function()?;
                        let slot = self.create_entry_alloca(function, name.as_str(), *ty)?;
                        self.store(slot, value, *ty)?;
                        self.locals.insert(*name, Binding::Slot(slot, *ty));
                        Ok(())
                    }
                }
            }
            StmtKind::If { cond, then, else_ } => self.lower_if(cond, then, else_.as_deref()),
            StmtKind::While { cond, body } => self.lower_while(cond, body),
            StmtKind::DoWhile { body, cond } => self.lower_do_while(body, cond),
            StmtKind::Print(expr) => self.lower_print(expr),
            StmtKind::Return(expr) => {
                let function = self.current_function()?;
                let (_, return_type) = *self
                    .signatures
                    .get(&self.function_symbol(function))
                    .ok_or_else(|| CodeGenError::Internal("function signature missing".into()))?;
                let value = self.lower_expr(expr)?;
                let value = self.cast_to(value, expr.ty, return_type)?;
                self.build_return_value(value)
            }
            StmtKind::ExprStmt(expr) => {
                // Code-generated for side effects, not dropped.
                self.lower_expr(expr).map(|_| ())
            }
        }
    }

    fn lower_if(&mut self, cond: &Expr, then: &Stmt, else_: Option<&Stmt>) -> Result<()> {
        let function = self.current_function()?;
        let cond_val = self.lower_expr(cond)?.into_int_value();

        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = self.context.append_basic_block(function, "else");
        let merge_bb = self.context.append_basic_block(function, "ifmerge");

        self.builder
            .build_conditional_branch(cond_val, then_bb, else_bb)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("conditional branch: {e}")))?;

        self.builder.position_at_end(then_bb);
        self.lower_stmt(then)?;
        if self.current_block_is_open() {
            self.branch_to(merge_bb)?;
        }

        self.builder.position_at_end(else_bb);
        if let Some(else_) = else_ {
            self.lower_stmt(else_)?;
        }
        if self.current_block_is_open() {
            self.branch_to(merge_bb)?;
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn lower_while(&mut self, cond: &Expr, body: &Stmt) -> Result<()> {
        let function = self.current_function()?;
        let loop_bb = self.context.append_basic_block(function, "loop");
        let body_bb = self.context.append_basic_block(function, "loopbody");
        let after_bb = self.context.append_basic_block(function, "after");

        self.branch_to(loop_bb)?;
        self.builder.position_at_end(loop_bb);
        let cond_val = self.lower_expr(cond)?.into_int_value();
        self.builder
            .build_conditional_branch(cond_val, body_bb, after_bb)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("conditional branch: {e}")))?;

        self.builder.position_at_end(body_bb);
        self.lower_stmt(body)?;
        if self.current_block_is_open() {
            self.branch_to(loop_bb)?;
        }

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    fn lower_do_while(&mut self, body: &Stmt, cond: &Expr) -> Result<()> {
        let function = self.current_function()?;
        let loop_bb = self.context.append_basic_block(function, "doloop");
        let after_bb = self.context.append_basic_block(function, "after");

        self.branch_to(loop_bb)?;
        self.builder.position_at_end(loop_bb);
        self.lower_stmt(body)?;
        let cond_val = self.lower_expr(cond)?.into_int_value();
        self.builder
            .build_conditional_branch(cond_val, loop_bb, after_bb)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("conditional branch: {e}")))?;

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    fn lower_print(&mut self, expr: &Expr) -> Result<()> {
        let value = self.lower_expr(expr)?;
        let printf_fn = self
            .printf_fn
            .ok_or_else(|| CodeGenError::Internal("printf not declared".into()))?;

        let (fmt_ptr, arg): (PointerValue<'ctx>, BasicValueEnum<'ctx>) = if expr.ty == Type::Float {
            let widened = self
                .builder
                .build_float_ext(value.into_float_value(), self.context.f64_type(), "widen")
                .map_err(|e| CodeGenError::LlvmOperationFailed(format!("float ext: {e}")))?;
            (self.format_f.unwrap(), widened.as_basic_value_enum())
        } else {
            (self.format_i.unwrap(), value)
        };

        self.builder
            .build_call(printf_fn, &[fmt_ptr.into(), arg.into()], "printf_call")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("printf call: {e}")))?;
        Ok(())
    }

    // -- shared expression lowering (both dialects) --

    fn lower_expr(&mut self, expr: &Expr) -> Result<BasicValueEnum<'ctx>> {
        match &expr.kind {
            ExprKind::IntLit(n) => Ok(self
                .context
                .i32_type()
                .const_int(*n as u64, true)
                .as_basic_value_enum()),
            ExprKind::FloatLit(f) => {
                let width = if expr.ty == Type::Float && self.current_function_is_expr_dialect() {
                    self.context.f64_type()
                } else {
                    self.context.f32_type()
                };
                Ok(width.const_float(*f as f64).as_basic_value_enum())
            }
            ExprKind::BoolLit(b) => Ok(self
                .context
                .bool_type()
                .const_int(*b as u64, false)
                .as_basic_value_enum()),
            ExprKind::Var(name) => self.lower_var(*name),
            ExprKind::Unary(op, sub) => self.lower_unary(*op, sub),
            ExprKind::Binary(op, lhs, rhs) => self.lower_binary(*op, lhs, rhs, expr.ty),
            ExprKind::Call(name, args) => self.lower_call(*name, args),
            ExprKind::If { cond, then, else_ } => self.lower_expr_if(cond, then, else_),
            ExprKind::For { var, start, end, step, body } => {
                self.lower_for(*var, start, end, step.as_deref(), body)
            }
            ExprKind::VarExpr { bindings, body } => self.lower_var_expr(bindings, body),
        }
    }

    fn lower_var(&mut self, name: Symbol) -> Result<BasicValueEnum<'ctx>> {
        match self.locals.get(&name) {
            Some(Binding::Arg(v)) => Ok(*v),
            Some(Binding::Slot(slot, ty)) => {
                let slot = *slot;
                let ty = *ty;
                self.load(slot, ty)
            }
            None => Err(CodeGenError::UndefinedVariable(name.to_string())),
        }
    }

    fn lower_unary(&mut self, op: UnOp, sub: &Expr) -> Result<BasicValueEnum<'ctx>> {
        let value = self.lower_expr(sub)?;
        match op {
            UnOp::Neg if sub.ty == Type::Float => Ok(self
                .builder
                .build_float_neg(value.into_float_value(), "fneg")
                .map_err(|e| CodeGenError::LlvmOperationFailed(format!("fneg: {e}")))?
                .as_basic_value_enum()),
            UnOp::Neg => Ok(self
                .builder
                .build_int_neg(value.into_int_value(), "ineg")
                .map_err(|e| CodeGenError::LlvmOperationFailed(format!("ineg: {e}")))?
                .as_basic_value_enum()),
            UnOp::Not => Ok(self
                .builder
                .build_not(value.into_int_value(), "not")
                .map_err(|e| CodeGenError::LlvmOperationFailed(format!("not: {e}")))?
                .as_basic_value_enum()),
        }
    }

    fn lower_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        result_ty: Type,
    ) -> Result<BasicValueEnum<'ctx>> {
        // Expression-dialect-only special case: `=` evaluates the RHS and
        // stores it into the LHS `Var`'s slot.
        if op == BinOp::Assign {
            let ExprKind::Var(name) = lhs.kind else {
                return Err(CodeGenError::Internal("assignment target is not a Var".into()));
            };
            let value = self.lower_expr(rhs)?;
            let Some(Binding::Slot(slot, ty)) = self.locals.get(&name).map(|b| match b {
                Binding::Slot(p, t) => Binding::Slot(*p, *t),
                Binding::Arg(v) => Binding::Arg(*v),
            }) else {
                return Err(CodeGenError::UndefinedVariable(name.to_string()));
            };
            self.store(slot, value, ty)?;
            return Ok(value);
        }

        let lhs_val = self.lower_expr(lhs)?;
        let rhs_val = self.lower_expr(rhs)?;
        let promoted = Type::promote(lhs.ty, rhs.ty);

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                self.lower_arithmetic(op, lhs_val, lhs.ty, rhs_val, rhs.ty, promoted)
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne => {
                self.lower_relational(op, lhs_val, lhs.ty, rhs_val, rhs.ty, promoted)
            }
            BinOp::And | BinOp::Or | BinOp::Xor => {
                self.lower_logical(op, lhs_val.into_int_value(), rhs_val.into_int_value())
            }
            BinOp::Assign => unreachable!("handled above"),
        }
        .map(|v| {
            let _ = result_ty;
            v
        })
    }

    fn lower_arithmetic(
        &mut self,
        op: BinOp,
        lhs: BasicValueEnum<'ctx>,
        lhs_ty: Type,
        rhs: BasicValueEnum<'ctx>,
        rhs_ty: Type,
        promoted: Type,
    ) -> Result<BasicValueEnum<'ctx>> {
        if promoted == Type::Float {
            let l = self.cast_to(lhs, lhs_ty, Type::Float)?.into_float_value();
            let r = self.cast_to(rhs, rhs_ty, Type::Float)?.into_float_value();
            let result: FloatValue<'ctx> = match op {
                BinOp::Add => self.builder.build_float_add(l, r, "fadd"),
                BinOp::Sub => self.builder.build_float_sub(l, r, "fsub"),
                BinOp::Mul => self.builder.build_float_mul(l, r, "fmul"),
                BinOp::Div => self.builder.build_float_div(l, r, "fdiv"),
                _ => unreachable!(),
            }
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("float arithmetic: {e}")))?;
            Ok(result.as_basic_value_enum())
        } else {
            let l = lhs.into_int_value();
            let r = rhs.into_int_value();
            let result: IntValue<'ctx> = match op {
                BinOp::Add => self.builder.build_int_add(l, r, "iadd"),
                BinOp::Sub => self.builder.build_int_sub(l, r, "isub"),
                BinOp::Mul => self.builder.build_int_mul(l, r, "imul"),
                // Integers are signed, so division is signed too.
                BinOp::Div => self.builder.build_int_signed_div(l, r, "sdiv"),
                _ => unreachable!(),
            }
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("int arithmetic: {e}")))?;
            Ok(result.as_basic_value_enum())
        }
    }

    fn lower_relational(
        &mut self,
        op: BinOp,
        lhs: BasicValueEnum<'ctx>,
        lhs_ty: Type,
        rhs: BasicValueEnum<'ctx>,
        rhs_ty: Type,
        promoted: Type,
    ) -> Result<BasicValueEnum<'ctx>> {
        if promoted == Type::Float {
            let l = self.cast_to(lhs, lhs_ty, Type::Float)?.into_float_value();
            let r = self.cast_to(rhs, rhs_ty, Type::Float)?.into_float_value();
            if self.current_function_is_expr_dialect() {
                // Every value in this dialect is a double, including the
                // result of a comparison: `fcmp ult` then widen the `i1`
                // back to 0.0/1.0 rather than leaving it as a boolean.
                let pred = match op {
                    BinOp::Eq => FloatPredicate::UEQ,
                    BinOp::Ne => FloatPredicate::UNE,
                    BinOp::Gt => FloatPredicate::UGT,
                    BinOp::Lt => FloatPredicate::ULT,
                    BinOp::Ge => FloatPredicate::UGE,
                    BinOp::Le => FloatPredicate::ULE,
                    _ => unreachable!(),
                };
                let cmp = self
                    .builder
                    .build_float_compare(pred, l, r, "cmptmp")
                    .map_err(|e| CodeGenError::LlvmOperationFailed(format!("fcmp: {e}")))?;
                let widened = self
                    .builder
                    .build_unsigned_int_to_float(cmp, self.context.f64_type(), "booltmp")
                    .map_err(|e| CodeGenError::LlvmOperationFailed(format!("uitofp: {e}")))?;
                return Ok(widened.as_basic_value_enum());
            }
            let pred = match op {
                BinOp::Eq => FloatPredicate::OEQ,
                BinOp::Ne => FloatPredicate::ONE,
                BinOp::Gt => FloatPredicate::OGT,
                BinOp::Lt => FloatPredicate::OLT,
                BinOp::Ge => FloatPredicate::OGE,
                BinOp::Le => FloatPredicate::OLE,
                _ => unreachable!(),
            };
            let cmp = self
                .builder
                .build_float_compare(pred, l, r, "fcmp")
                .map_err(|e| CodeGenError::LlvmOperationFailed(format!("fcmp: {e}")))?;
            Ok(cmp.as_basic_value_enum())
        } else {
            let l = lhs.into_int_value();
            let r = rhs.into_int_value();
            let pred = match op {
                BinOp::Eq => IntPredicate::EQ,
                BinOp::Ne => IntPredicate::NE,
                BinOp::Gt => IntPredicate::SGT,
                BinOp::Lt => IntPredicate::SLT,
                BinOp::Ge => IntPredicate::SGE,
                BinOp::Le => IntPredicate::SLE,
                _ => unreachable!(),
            };
            let cmp = self
                .builder
                .build_int_compare(pred, l, r, "icmp")
                .map_err(|e| CodeGenError::LlvmOperationFailed(format!("icmp: {e}")))?;
            Ok(cmp.as_basic_value_enum())
        }
    }

    fn lower_logical(
        &mut self,
        op: BinOp,
        lhs: IntValue<'ctx>,
        rhs: IntValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let result = match op {
            BinOp::And => self.builder.build_and(lhs, rhs, "and"),
            BinOp::Or => self.builder.build_or(lhs, rhs, "or"),
            BinOp::Xor => self.builder.build_xor(lhs, rhs, "xor"),
            _ => unreachable!(),
        }
        .map_err(|e| CodeGenError::LlvmOperationFailed(format!("logical op: {e}")))?;
        Ok(result.as_basic_value_enum())
    }

    fn lower_call(&mut self, name: Symbol, args: &[Expr]) -> Result<BasicValueEnum<'ctx>> {
        let function = self.ensure_function_declared(name)?;
        let (param_types, _return_type) = self
            .signatures
            .get(&name)
            .cloned()
            .ok_or(CodeGenError::UndefinedFunction(name.to_string()))?;

        if param_types.len() != args.len() {
            return Err(CodeGenError::ArityMismatch(
                name.to_string(),
                param_types.len(),
                args.len(),
            ));
        }

        let mut llvm_args = Vec::with_capacity(args.len());
        for (arg, declared_ty) in args.iter().zip(param_types.iter()) {
            let value = self.lower_expr(arg)?;
            let value = self.cast_to(value, arg.ty, *declared_ty)?;
            llvm_args.push(value.into());
        }

        let call = self
            .builder
            .build_call(function, &llvm_args, "call")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("call: {e}")))?;
        call.try_as_basic_value()
            .left()
            .ok_or_else(|| CodeGenError::Internal(format!("call to '{name}' returned void")))
    }

    // -- expression-dialect-only constructs --

    fn lower_expr_if(&mut self, cond: &Expr, then: &Expr, else_: &Expr) -> Result<BasicValueEnum<'ctx>> {
        let function = self.current_function()?;
        let cond_val = self.lower_expr(cond)?.into_float_value();
        let zero = self.context.f64_type().const_float(0.0);
        let cond_bool = self
            .builder
            .build_float_compare(FloatPredicate::ONE, cond_val, zero, "ifcond")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("ifcond: {e}")))?;

        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = self.context.append_basic_block(function, "else");
        let merge_bb = self.context.append_basic_block(function, "ifcont");

        self.builder
            .build_conditional_branch(cond_bool, then_bb, else_bb)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("conditional branch: {e}")))?;

        self.builder.position_at_end(then_bb);
        let then_val = self.lower_expr(then)?.into_float_value();
        self.branch_to(merge_bb)?;
        let then_end_bb = self.builder.get_insert_block().unwrap();

        self.builder.position_at_end(else_bb);
        let else_val = self.lower_expr(else_)?.into_float_value();
        self.branch_to(merge_bb)?;
        let else_end_bb = self.builder.get_insert_block().unwrap();

        self.builder.position_at_end(merge_bb);
        let phi = self
            .builder
            .build_phi(self.context.f64_type(), "iftmp")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("phi: {e}")))?;
        phi.add_incoming(&[(&then_val, then_end_bb), (&else_val, else_end_bb)]);
        Ok(phi.as_basic_value())
    }

    fn lower_for(
        &mut self,
        var: Symbol,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
    ) -> Result<BasicValueEnum<'ctx>> {
        let function = self.current_function()?;
        let start_val = self.lower_expr(start)?.into_float_value();

        let slot = self.create_entry_alloca(function, var.as_str(), Type::Float)?;
        self.store(slot, start_val.as_basic_value_enum(), Type::Float)?;

        let loop_bb = self.context.append_basic_block(function, "forloop");
        self.branch_to(loop_bb)?;
        self.builder.position_at_end(loop_bb);

        // Shadow any existing binding of `var` for the duration of the loop
        // body, restored LIFO once the loop exits.
        let shadowed = self.locals.insert(var, Binding::Slot(slot, Type::Float));

        self.lower_expr(body)?;

        let step_val = match step {
            Some(step) => self.lower_expr(step)?.into_float_value(),
            None => self.context.f64_type().const_float(1.0),
        };
        let current = self.load(slot, Type::Float)?.into_float_value();
        let next = self
            .builder
            .build_float_add(current, step_val, "nextvar")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("for-step add: {e}")))?;
        self.store(slot, next.as_basic_value_enum(), Type::Float)?;

        let end_val = self.lower_expr(end)?.into_float_value();
        let zero = self.context.f64_type().const_float(0.0);
        let end_cond = self
            .builder
            .build_float_compare(FloatPredicate::ONE, end_val, zero, "loopcond")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("loopcond: {e}")))?;

        let after_bb = self.context.append_basic_block(function, "afterloop");
        self.builder
            .build_conditional_branch(end_cond, loop_bb, after_bb)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("conditional branch: {e}")))?;
        self.builder.position_at_end(after_bb);

        match shadowed {
            Some(prev) => {
                self.locals.insert(var, prev);
            }
            None => {
                self.locals.remove(&var);
            }
        }

        Ok(self.context.f64_type().const_float(0.0).as_basic_value_enum())
    }

    fn lower_var_expr(
        &mut self,
        bindings: &[pudlc_ast::VarBinding],
        body: &Expr,
    ) -> Result<BasicValueEnum<'ctx>> {
        let function = self.current_function()?;
        let mut shadow_stack = Vec::with_capacity(bindings.len());

        for binding in bindings {
            let init_val = match &binding.init {
                Some(init) => self.lower_expr(init)?.into_float_value(),
                None => self.context.f64_type().const_float(0.0),
            };
            let slot = self.create_entry_alloca(function, binding.name.as_str(), Type::Float)?;
            self.store(slot, init_val.as_basic_value_enum(), Type::Float)?;
            let prev = self.locals.insert(binding.name, Binding::Slot(slot, Type::Float));
            shadow_stack.push((binding.name, prev));
        }

        let result = self.lower_expr(body)?;

        // LIFO restore.
        for (name, prev) in shadow_stack.into_iter().rev() {
            match prev {
                Some(binding) => {
                    self.locals.insert(name, binding);
                }
                None => {
                    self.locals.remove(&name);
                }
            }
        }

        Ok(result)
    }

    // -- shared helpers --

    fn current_function(&self) -> Result<FunctionValue<'ctx>> {
        self.current_function
            .ok_or_else(|| CodeGenError::Internal("no function is currently being lowered".into()))
    }

    fn current_function_is_expr_dialect(&self) -> bool {
        self.current_function
            .map(|f| f.get_type().get_return_type() == Some(self.context.f64_type().into()))
            .unwrap_or(false)
    }

    fn function_symbol(&self, function: FunctionValue<'ctx>) -> Symbol {
        Symbol::intern(function.get_name().to_str().unwrap_or(""))
    }

    fn current_block_is_open(&self) -> bool {
        self.builder
            .get_insert_block()
            .map(|b| b.get_terminator().is_none())
            .unwrap_or(false)
    }

    fn branch_to(&self, target: BasicBlock<'ctx>) -> Result<()> {
        self.builder
            .build_unconditional_branch(target)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("branch: {e}")))?;
        Ok(())
    }

    fn build_return_value(&self, value: BasicValueEnum<'ctx>) -> Result<()> {
        self.builder
            .build_return(Some(&value))
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("return: {e}")))?;
        Ok(())
    }

    fn default_value(&self, ty: Type) -> Result<BasicValueEnum<'ctx>> {
        Ok(match ty {
            Type::Bool => self.context.bool_type().const_int(0, false).as_basic_value_enum(),
            Type::Integer => self.context.i32_type().const_int(0, true).as_basic_value_enum(),
            Type::Float => self.context.f32_type().const_float(0.0).as_basic_value_enum(),
            Type::Undefined => return Err(CodeGenError::Internal("undefined default value".into())),
        })
    }

    /// Creates a stack slot at the *start* of the function's entry block,
    /// not at the builder's current insertion point, so later reg-promotion
    /// passes see every local declared up front.
    fn create_entry_alloca(
        &self,
        function: FunctionValue<'ctx>,
        name: &str,
        ty: Type,
    ) -> Result<PointerValue<'ctx>> {
        let entry = function.get_first_basic_block().ok_or(CodeGenError::BlockNotOpen)?;
        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first_instr) => builder.position_before(&first_instr),
            None => builder.position_at_end(entry),
        }
        builder
            .build_alloca(self.basic_type(ty), name)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("alloca: {e}")))
    }

    fn load(&self, slot: PointerValue<'ctx>, ty: Type) -> Result<BasicValueEnum<'ctx>> {
        self.builder
            .build_load(self.basic_type(ty), slot, "load")
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("load: {e}")))
    }

    fn store(&self, slot: PointerValue<'ctx>, value: BasicValueEnum<'ctx>, _ty: Type) -> Result<()> {
        self.builder
            .build_store(slot, value)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("store: {e}")))?;
        Ok(())
    }

    fn basic_type(&self, ty: Type) -> BasicTypeEnum<'ctx> {
        match ty {
            Type::Bool => self.context.bool_type().into(),
            Type::Integer => self.context.i32_type().into(),
            Type::Float => self.context.f32_type().into(),
            Type::Undefined => self.context.f64_type().into(),
        }
    }

    /// Casts `value` (of static type `from`) to `to`, choosing the opcode by
    /// the `(src, dst)` pair at declaration/assignment/return/call-argument
    /// boundaries. Numeric narrowing is permitted here; `Bool`↔numeric never
    /// reaches this point because the parser already rejected it.
    fn cast_to(&self, value: BasicValueEnum<'ctx>, from: Type, to: Type) -> Result<BasicValueEnum<'ctx>> {
        if from == to {
            return Ok(value);
        }
        match (from, to) {
            (Type::Integer, Type::Float) => {
                let v = self
                    .builder
                    .build_signed_int_to_float(value.into_int_value(), self.float_llvm_type(to), "sitofp")
                    .map_err(|e| CodeGenError::LlvmOperationFailed(format!("sitofp: {e}")))?;
                Ok(v.as_basic_value_enum())
            }
            (Type::Float, Type::Integer) => {
                let v = self
                    .builder
                    .build_float_to_signed_int(value.into_float_value(), self.context.i32_type(), "fptosi")
                    .map_err(|e| CodeGenError::LlvmOperationFailed(format!("fptosi: {e}")))?;
                Ok(v.as_basic_value_enum())
            }
            (Type::Float, Type::Float) => {
                let dst = self.float_llvm_type(to);
                let v = self
                    .builder
                    .build_float_cast(value.into_float_value(), dst, "fpcast")
                    .map_err(|e| CodeGenError::LlvmOperationFailed(format!("fpcast: {e}")))?;
                Ok(v.as_basic_value_enum())
            }
            _ => Err(CodeGenError::Internal(format!(
                "no cast path from {from} to {to}"
            ))),
        }
    }

    fn float_llvm_type(&self, ty: Type) -> inkwell::types::FloatType<'ctx> {
        debug_assert_eq!(ty, Type::Float);
        if self.current_function_is_expr_dialect() {
            self.context.f64_type()
        } else {
            self.context.f32_type()
        }
    }
}
