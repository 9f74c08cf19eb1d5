//! End-to-end tests: register bindings, compile scripts, and run them.
//!
//! Bindings record what they were asked to do through shared probes, so the
//! tests can count constructions, invocations, and argument evaluations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ember::{
    BinaryOp, BindingCacheScope, BindingDef, CompilationError, CompilerOptions, Context,
    ContextError, DataType, Dynamic, Expr, FunctionDecl, NativeError, RegistrationError,
    RuntimeError, Script, Span, Stmt, Unit,
};

// =============================================================================
// Harness
// =============================================================================

#[derive(Default, Clone)]
struct Probes {
    built: Arc<AtomicUsize>,
    invoked: Arc<AtomicUsize>,
    tallies: Arc<AtomicUsize>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl Probes {
    fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    fn invoked(&self) -> usize {
        self.invoked.load(Ordering::SeqCst)
    }

    fn tallies(&self) -> usize {
        self.tallies.load(Ordering::SeqCst)
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

struct Counter {
    total: i32,
}

struct Logger {
    prefix: String,
}

fn at(col: u32) -> Span {
    Span::point(1, col)
}

/// Bindings:
///
/// - `count(start: int | step: int) -> int` on `Counter`: adds `step` to a
///   running total seeded with `start`
/// - `tally() -> int` on `Tally`: returns how many times it has been called
/// - `log(prefix: string | message: string)` on `Logger`
/// - `describe(| a: long, b: double, c: any) -> string` on `Describer`
/// - `explode()` on `Bomb`: always fails
fn context(probes: &Probes, options: CompilerOptions) -> Context {
    let mut ctx = Context::with_options(options);

    let built = Arc::clone(&probes.built);
    let invoked = Arc::clone(&probes.invoked);
    ctx.register(
        BindingDef::builder("count", "Counter")
            .constructor_params([DataType::int()])
            .method_params([DataType::int()])
            .returns(DataType::int())
            .constructor(move |args: &[Dynamic]| {
                built.fetch_add(1, Ordering::SeqCst);
                Ok(Counter {
                    total: args[0].as_int().unwrap_or_default(),
                })
            })
            .method(move |counter: &mut Counter, args: &[Dynamic]| {
                invoked.fetch_add(1, Ordering::SeqCst);
                counter.total += args[0].as_int().unwrap_or_default();
                Ok(Dynamic::Int(counter.total))
            })
            .build()
            .unwrap(),
    )
    .unwrap();

    let tallies = Arc::clone(&probes.tallies);
    ctx.register(
        BindingDef::builder("tally", "Tally")
            .returns(DataType::int())
            .constructor(|_: &[Dynamic]| Ok(()))
            .method(move |_: &mut (), _: &[Dynamic]| {
                let n = tallies.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(Dynamic::Int(n as i32))
            })
            .build()
            .unwrap(),
    )
    .unwrap();

    let built = Arc::clone(&probes.built);
    let lines = Arc::clone(&probes.lines);
    ctx.register(
        BindingDef::builder("log", "Logger")
            .constructor_params([DataType::string()])
            .method_params([DataType::string()])
            .constructor(move |args: &[Dynamic]| {
                built.fetch_add(1, Ordering::SeqCst);
                Ok(Logger {
                    prefix: args[0].as_str().unwrap_or_default().to_string(),
                })
            })
            .method(move |logger: &mut Logger, args: &[Dynamic]| {
                let message = args[0].as_str().unwrap_or_default();
                lines
                    .lock()
                    .map_err(|_| NativeError::failed("poisoned"))?
                    .push(format!("{}{}", logger.prefix, message));
                Ok(Dynamic::Void)
            })
            .build()
            .unwrap(),
    )
    .unwrap();

    ctx.register(
        BindingDef::builder("describe", "Describer")
            .method_params([DataType::long(), DataType::double(), DataType::any()])
            .returns(DataType::string())
            .constructor(|_: &[Dynamic]| Ok(()))
            .method(|_: &mut (), args: &[Dynamic]| {
                Ok(format!(
                    "{}|{:.1}|{}",
                    args[0].as_long().unwrap_or_default(),
                    args[1].as_double().unwrap_or_default(),
                    args[2].as_str().unwrap_or("?"),
                )
                .into())
            })
            .build()
            .unwrap(),
    )
    .unwrap();

    ctx.register(
        BindingDef::builder("explode", "Bomb")
            .constructor(|_: &[Dynamic]| Ok(()))
            .method(|_: &mut (), _: &[Dynamic]| Err(NativeError::failed("boom")))
            .build()
            .unwrap(),
    )
    .unwrap();

    ctx.seal().unwrap();
    ctx
}

fn compile(probes: &Probes, script: Script) -> Unit {
    context(probes, CompilerOptions::default())
        .compile(script)
        .unwrap()
}

fn call(name: &str, args: Vec<Expr>, col: u32) -> Expr {
    Expr::call(name, args, at(col))
}

fn log_stmt(prefix: &str, message: &str, col: u32) -> Stmt {
    Stmt::expr(call(
        "log",
        vec![Expr::string(prefix, at(col + 4)), Expr::string(message, at(col + 9))],
        col,
    ))
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn local_function_shadows_binding() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new()
            .function(
                FunctionDecl::new("count", DataType::int(), at(1))
                    .param("a", DataType::int())
                    .param("b", DataType::int())
                    .body([Stmt::return_value(
                        Expr::binary(
                            BinaryOp::Mul,
                            Expr::variable("a", at(30)),
                            Expr::variable("b", at(34)),
                            at(32),
                        ),
                        at(23),
                    )]),
            )
            .body([Stmt::return_value(
                call("count", vec![Expr::int(10, at(14)), Expr::int(3, at(18))], 8),
                at(1),
            )]),
    );

    let mut instance = unit.instantiate();
    assert_eq!(instance.execute(&[]).unwrap(), Dynamic::Int(30));
    assert_eq!(probes.built(), 0);
    assert_eq!(probes.invoked(), 0);
    assert_eq!(unit.compiled().slot_count(), 0);
}

#[test]
fn binding_of_other_arity_is_not_shadowed() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new()
            .function(
                FunctionDecl::new("count", DataType::int(), at(1))
                    .param("a", DataType::int())
                    .body([Stmt::return_value(Expr::variable("a", at(30)), at(23))]),
            )
            .body([Stmt::return_value(
                call("count", vec![Expr::int(10, at(14)), Expr::int(3, at(18))], 8),
                at(1),
            )]),
    );

    let mut instance = unit.instantiate();
    assert_eq!(instance.execute(&[]).unwrap(), Dynamic::Int(13));
    assert_eq!(probes.built(), 1);
}

#[test]
fn wrong_arity_reports_name_and_count() {
    let probes = Probes::default();
    let err = context(&probes, CompilerOptions::default())
        .compile(Script::new().body([Stmt::expr(call("count", vec![Expr::int(1, at(7))], 1))]))
        .unwrap_err();

    match err {
        ContextError::Compilation(CompilationError::UnknownCall {
            name,
            arg_count,
            span,
        }) => {
            assert_eq!(name, "count");
            assert_eq!(arg_count, 1);
            assert_eq!(span, at(1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn argument_coercion_error_points_at_argument() {
    let probes = Probes::default();
    let err = context(&probes, CompilerOptions::default())
        .compile(Script::new().body([Stmt::expr(call(
            "count",
            vec![Expr::string("ten", at(7)), Expr::int(1, at(14))],
            1,
        ))]))
        .unwrap_err();

    match err {
        ContextError::Compilation(err @ CompilationError::ArgumentCoercion { .. }) => {
            assert_eq!(err.span(), at(7));
            assert_eq!(
                err.to_string(),
                "at 1:7: argument 0 of call [count] cannot be converted from 'string' to 'int'"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

// =============================================================================
// Construct once, invoke every time
// =============================================================================

#[test]
fn binding_object_is_built_once_per_instance() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new().body([Stmt::return_value(
            call("count", vec![Expr::int(10, at(14)), Expr::int(1, at(18))], 8),
            at(1),
        )]),
    );

    let mut instance = unit.instantiate();
    let results: Vec<_> = (0..3).map(|_| instance.execute(&[]).unwrap()).collect();
    assert_eq!(
        results,
        vec![Dynamic::Int(11), Dynamic::Int(12), Dynamic::Int(13)]
    );
    assert_eq!(probes.built(), 1);
    assert_eq!(probes.invoked(), 3);
    assert_eq!(instance.constructed_objects(), 1);

    let mut fresh = unit.instantiate();
    assert_eq!(fresh.execute(&[]).unwrap(), Dynamic::Int(11));
    assert_eq!(probes.built(), 2);
}

#[test]
fn constructor_arguments_are_evaluated_once() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new().body([Stmt::return_value(
            call(
                "count",
                vec![call("tally", vec![], 14), call("tally", vec![], 23)],
                8,
            ),
            at(1),
        )]),
    );

    let mut instance = unit.instantiate();
    for _ in 0..3 {
        instance.execute(&[]).unwrap();
    }

    // one constructor-argument evaluation plus one method-argument
    // evaluation per execution
    assert_eq!(probes.tallies(), 4);
    assert_eq!(probes.built(), 1);
    assert_eq!(probes.invoked(), 3);
}

#[test]
fn arguments_keep_their_order_after_coercion() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new().body([Stmt::return_value(
            call(
                "describe",
                vec![
                    Expr::int(1, at(10)),
                    Expr::int(2, at(13)),
                    Expr::string("z", at(16)),
                ],
                1,
            ),
            at(1),
        )]),
    );

    let mut instance = unit.instantiate();
    assert_eq!(instance.execute(&[]).unwrap(), Dynamic::from("1|2.0|z"));
}

// =============================================================================
// Cache slot policy
// =============================================================================

#[test]
fn per_type_slots_reuse_the_first_object() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new().body([log_stmt("A", "x", 1), log_stmt("B", "y", 20)]),
    );

    let mut instance = unit.instantiate();
    instance.execute(&[]).unwrap();

    assert_eq!(probes.lines(), vec!["Ax".to_string(), "Ay".to_string()]);
    assert_eq!(probes.built(), 1);
    assert_eq!(unit.compiled().slot_count(), 1);
}

#[test]
fn per_call_site_slots_build_one_object_each() {
    let probes = Probes::default();
    let options = CompilerOptions::default().with_binding_cache(BindingCacheScope::PerCallSite);
    let unit = context(&probes, options)
        .compile(Script::new().body([log_stmt("A", "x", 1), log_stmt("B", "y", 20)]))
        .unwrap();

    let mut instance = unit.instantiate();
    instance.execute(&[]).unwrap();
    instance.execute(&[]).unwrap();

    assert_eq!(
        probes.lines(),
        vec!["Ax", "By", "Ax", "By"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
    assert_eq!(probes.built(), 2);
    assert_eq!(instance.constructed_objects(), 2);
}

#[test]
fn per_type_slot_is_shared_with_local_functions() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new()
            .function(
                FunctionDecl::new("greet", DataType::void(), at(1))
                    .body([log_stmt("F", "1", 1)]),
            )
            .body([
                Stmt::expr(call("greet", vec![], 1)),
                log_stmt("M", "2", 10),
            ]),
    );

    let mut instance = unit.instantiate();
    instance.execute(&[]).unwrap();

    assert_eq!(probes.lines(), vec!["F1".to_string(), "F2".to_string()]);
    assert_eq!(probes.built(), 1);
}

struct Shouter {
    prefix: String,
}

struct Whisperer;

fn shout_binding() -> BindingDef {
    BindingDef::builder("shout", "Speaker")
        .constructor_params([DataType::string()])
        .method_params([DataType::string()])
        .returns(DataType::string())
        .constructor(|args: &[Dynamic]| {
            Ok(Shouter {
                prefix: args[0].as_str().unwrap_or_default().to_string(),
            })
        })
        .method(|s: &mut Shouter, args: &[Dynamic]| {
            Ok(format!("{}{}!", s.prefix, args[0].as_str().unwrap_or_default()).into())
        })
        .build()
        .unwrap()
}

#[test]
fn object_type_name_cannot_change_rust_type() {
    let mut ctx = Context::new();
    ctx.register(shout_binding()).unwrap();

    let err = ctx
        .register(
            BindingDef::builder("whisper", "Speaker")
                .method_params([DataType::string()])
                .returns(DataType::string())
                .constructor(|_: &[Dynamic]| Ok(Whisperer))
                .method(|_: &mut Whisperer, args: &[Dynamic]| Ok(args[0].clone()))
                .build()
                .unwrap(),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ContextError::Registration(RegistrationError::ConflictingObjectType {
            ref name,
            ref object_name,
            ..
        }) if name == "whisper" && object_name == "Speaker"
    ));
}

#[test]
fn bindings_sharing_an_object_type_share_the_object() {
    let mut ctx = Context::new();
    ctx.register(shout_binding()).unwrap();
    ctx.register(
        BindingDef::builder("whisper", "Speaker")
            .constructor_params([DataType::string()])
            .method_params([DataType::string()])
            .returns(DataType::string())
            .constructor(|_: &[Dynamic]| Ok(Shouter { prefix: "?".into() }))
            .method(|s: &mut Shouter, args: &[Dynamic]| {
                Ok(format!("{}{}", s.prefix, args[0].as_str().unwrap_or_default()).into())
            })
            .build()
            .unwrap(),
    )
    .unwrap();
    ctx.seal().unwrap();

    let unit = ctx
        .compile(Script::new().body([
            Stmt::expr(call(
                "shout",
                vec![Expr::string("> ", at(7)), Expr::string("a", at(13))],
                1,
            )),
            Stmt::return_value(
                call(
                    "whisper",
                    vec![Expr::string("- ", at(27)), Expr::string("b", at(33))],
                    19,
                ),
                at(12),
            ),
        ]))
        .unwrap();
    assert_eq!(unit.compiled().slot_count(), 1);

    let mut instance = unit.instantiate();
    let out = instance.execute(&[]).unwrap();
    assert_eq!(out.as_str(), Some("> b"));
    assert_eq!(instance.constructed_objects(), 1);
}

// =============================================================================
// Local calls
// =============================================================================

fn double_script() -> Script {
    Script::new()
        .function(
            FunctionDecl::new("double", DataType::int(), at(1))
                .param("x", DataType::int())
                .body([Stmt::return_value(
                    Expr::binary(
                        BinaryOp::Add,
                        Expr::variable("x", at(30)),
                        Expr::variable("x", at(34)),
                        at(32),
                    ),
                    at(23),
                )]),
        )
        .body([Stmt::return_value(
            call("double", vec![call("double", vec![Expr::int(3, at(22))], 15)], 8),
            at(1),
        )])
}

#[test]
fn nested_local_calls() {
    let probes = Probes::default();
    let unit = compile(&probes, double_script());

    let mut instance = unit.instantiate();
    assert_eq!(instance.execute(&[]).unwrap(), Dynamic::Int(12));
    assert_eq!(instance.call("double", &[Dynamic::Int(5)]).unwrap(), Dynamic::Int(10));
    assert_eq!(unit.compiled().slot_count(), 0);
}

#[test]
fn host_calls_check_arguments() {
    let probes = Probes::default();
    let unit = compile(&probes, double_script());
    let mut instance = unit.instantiate();

    assert!(matches!(
        instance.call("double", &[Dynamic::from("five")]),
        Err(RuntimeError::ArgumentType { position: 0, .. })
    ));
    assert!(matches!(
        instance.call("double", &[]),
        Err(RuntimeError::UnknownEntry { arity: 0, .. })
    ));
}

#[test]
fn runaway_recursion_overflows() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new()
            .function(
                FunctionDecl::new("forever", DataType::int(), at(1))
                    .body([Stmt::return_value(call("forever", vec![], 30), at(23))]),
            )
            .body([Stmt::return_value(call("forever", vec![], 8), at(1))]),
    );

    let err = unit.instantiate().execute(&[]).unwrap_err();
    assert!(matches!(err, RuntimeError::StackOverflow { .. }));
}

// =============================================================================
// Inputs and runtime failures
// =============================================================================

#[test]
fn inputs_are_checked() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new()
            .input("start", DataType::any())
            .input("ignored", DataType::string())
            .body([Stmt::return_value(
                call(
                    "count",
                    vec![Expr::variable("start", at(14)), Expr::int(0, at(21))],
                    8,
                ),
                at(1),
            )]),
    );
    assert_eq!(unit.used_inputs(), &["start".to_string()]);

    let mut instance = unit.instantiate();
    assert_eq!(
        instance.execute(&[]).unwrap_err(),
        RuntimeError::MissingInput {
            name: "start".into()
        }
    );
    assert_eq!(
        instance
            .execute(&[("start", Dynamic::from("x"))])
            .unwrap_err(),
        RuntimeError::InvalidCast {
            expected: "int",
            actual: "string",
        }
    );
    assert_eq!(
        instance.execute(&[("start", Dynamic::Int(7))]).unwrap(),
        Dynamic::Int(7)
    );
}

#[test]
fn native_failures_name_the_binding() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new().body([Stmt::expr(call("explode", vec![], 1))]),
    );

    let err = unit.instantiate().execute(&[]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Native {
            binding: "explode".into(),
            source: NativeError::failed("boom"),
        }
    );
}

#[test]
fn integer_division_by_zero() {
    let probes = Probes::default();
    let unit = compile(
        &probes,
        Script::new().body([Stmt::return_value(
            Expr::binary(BinaryOp::Div, Expr::int(1, at(8)), Expr::int(0, at(12)), at(10)),
            at(1),
        )]),
    );

    assert_eq!(
        unit.instantiate().execute(&[]).unwrap_err(),
        RuntimeError::DivisionByZero
    );
}

#[test]
fn units_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Unit>();
}
