//! wspace - CLI Entry Point
//!
//! Commands:
//! - `wspace run <program>` - Run a source or assembler file
//! - `wspace asm <source>` - Assemble to symbol text in a style
//! - `wspace ir <program>` - Dump the mnemonic form of a program
//! - `wspace debug <program>` - Interactive debugger
//! - `wspace test` - Built-in self-test

use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wspace::{Program, RunConfig};

#[derive(Parser)]
#[command(name = "wspace")]
#[command(author = "Yigit")]
#[command(version = "0.1.0")]
#[command(about = "Tokenizer, virtual machine and assembler for the Whitespace language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every command that reads a program.
#[derive(Args, Clone, Default)]
struct CommonOpts {
    /// Built-in style: origin (space/tab/lf) or stl (letters)
    #[arg(long)]
    style: Option<String>,
    /// JSON style description
    #[arg(long)]
    style_file: Option<PathBuf>,
    /// Strict tokenizing (incomplete input and missing END are errors)
    #[arg(long)]
    strict: bool,
    /// JSON run configuration; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log every executed instruction
    #[arg(long)]
    trace: bool,
    /// Treat the program as assembler text (implied by .wsa/.asm)
    #[arg(long)]
    asm: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it stops
    Run {
        /// Program file, or the program text itself
        program: String,
        /// Maximum number of instructions to execute
        #[arg(long)]
        max_steps: Option<u64>,
        /// Unbound FFI labels are errors
        #[arg(long)]
        strict_foreign: bool,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        opts: CommonOpts,
    },
    /// Assemble mnemonics to symbol text
    Asm {
        /// Assembler file, or the assembler text itself
        source: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        opts: CommonOpts,
    },
    /// Print the mnemonic form of a program
    Ir {
        /// Program file, or the program text itself
        program: String,
        #[command(flatten)]
        opts: CommonOpts,
    },
    /// Interactive debugger
    Debug {
        /// Program file, or the program text itself
        program: String,
        #[command(flatten)]
        opts: CommonOpts,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_steps, strict_foreign, json, opts }) => {
            let mut config = load_config(&opts);
            config.max_steps = max_steps.or(config.max_steps);
            config.strict_foreign |= strict_foreign;
            run_program(&program, &opts, &config, json);
        }
        Some(Commands::Asm { source, output, opts }) => {
            let config = load_config(&opts);
            assemble_file(&source, output, &config);
        }
        Some(Commands::Ir { program, opts }) => {
            let config = load_config(&opts);
            dump_ir(&program, &opts, &config);
        }
        Some(Commands::Debug { program, opts }) => {
            let config = load_config(&opts);
            debug_program(&program, &opts, &config);
        }
        Some(Commands::Test) => {
            init_logging(false);
            run_self_test();
        }
        None => {
            println!("wspace v0.1.0");
            println!("A Whitespace language toolkit");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(trace: bool) {
    let default = if trace { "wspace=trace" } else { "wspace=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}: {}", context, error);
    std::process::exit(1);
}

/// Config file (if any) with the command-line flags applied on top.
/// Installs logging to match the resulting `trace` setting.
fn load_config(opts: &CommonOpts) -> RunConfig {
    let mut config = match &opts.config {
        Some(path) => RunConfig::load(path).unwrap_or_else(|e| fail("Failed to load config", e)),
        None => RunConfig::default(),
    };
    if opts.style.is_some() {
        config.style = opts.style.clone();
    }
    if opts.style_file.is_some() {
        config.style_file = opts.style_file.clone();
    }
    config.strict |= opts.strict;
    config.trace |= opts.trace;
    init_logging(config.trace);
    config
}

fn is_assembler(arg: &str, opts: &CommonOpts) -> bool {
    opts.asm || arg.ends_with(".wsa") || arg.ends_with(".asm")
}

fn load_program(arg: &str, opts: &CommonOpts, config: &RunConfig) -> wspace::Result<Program> {
    let text = wspace::asm::read_program_text(arg)?;
    if is_assembler(arg, opts) {
        let asm = wspace::assemble(&text)?;
        eprintln!("📝 Assembled {} instructions", asm.program.len());
        Ok(asm.program)
    } else {
        let style = config.resolve_style()?;
        let program = config.lexer().tokenize_source(&text, &style)?;
        eprintln!("📂 Loaded {} instructions ({} style)", program.len(), style.name());
        Ok(program)
    }
}

fn run_program(arg: &str, opts: &CommonOpts, config: &RunConfig, json: bool) {
    use wspace::{Vm, VmState};

    let program = load_program(arg, opts, config).unwrap_or_else(|e| fail("Failed to load program", e));

    let mut vm = Vm::new(program).strict_foreign(config.strict_foreign);

    #[cfg(not(target_arch = "wasm32"))]
    {
        let interrupt = vm.interrupt_handle();
        // First Ctrl-C stops between instructions; a second one exits, since
        // a read blocked on stdin never gets back to check the flag
        if let Err(e) = ctrlc::set_handler(move || {
            if wspace::vm::raise_interrupt(&interrupt) {
                eprintln!();
                eprintln!("⚠️  Interrupted again, exiting");
                std::process::exit(130);
            }
        }) {
            tracing::warn!("could not install Ctrl-C handler: {}", e);
        }
    }

    let result = match config.max_steps {
        Some(limit) => vm.run_limited(limit),
        None => vm.run(),
    };
    let steps = result.unwrap_or_else(|e| {
        let at = vm.last_instruction().map(|i| i.to_string()).unwrap_or_default();
        fail(&format!("Runtime error at pc={} ({})", vm.pc(), at), e)
    });

    let snapshot = vm.snapshot();
    if json {
        match snapshot.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => fail("Failed to serialize state", e),
        }
        return;
    }

    eprintln!();
    eprintln!("━━━ Result ━━━");
    eprintln!("Steps: {}", steps);
    eprintln!("State: {:?}", vm.state());
    eprintln!("{}", snapshot);

    if vm.state() == VmState::Running {
        if let Some(limit) = config.max_steps {
            eprintln!();
            eprintln!("⚠️  Reached max steps limit ({}). Use --max-steps to increase.", limit);
        }
    }
}

fn assemble_file(source: &str, output: Option<PathBuf>, config: &RunConfig) {
    let style = config.resolve_style().unwrap_or_else(|e| fail("Invalid style", e));
    let text = wspace::asm::read_program_text(source).unwrap_or_else(|e| fail("Failed to read source", e));
    let asm = wspace::assemble(&text).unwrap_or_else(|e| fail("Assembly error", e));

    eprintln!("✓ Assembled {} instructions", asm.program.len());

    match output {
        Some(path) => {
            if let Err(e) = wspace::save_source(&path, &asm.symbols(), &style) {
                fail("Failed to save", e);
            }
            eprintln!("✓ Saved to {} ({} style)", path.display(), style.name());
        }
        None => print!("{}", asm.render(&style)),
    }
}

fn dump_ir(arg: &str, opts: &CommonOpts, config: &RunConfig) {
    let program = load_program(arg, opts, config).unwrap_or_else(|e| fail("Failed to load program", e));
    print!("{}", wspace::disassemble(&program));
}

#[cfg(feature = "tui")]
fn debug_program(arg: &str, opts: &CommonOpts, config: &RunConfig) {
    let program = load_program(arg, opts, config).unwrap_or_else(|e| fail("Failed to load program", e));

    if program.is_empty() {
        fail("Nothing to debug", "program is empty");
    }

    eprintln!("🚀 Launching debugger...");

    if let Err(e) = wspace::run_debugger(program) {
        fail("Debugger error", e);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_arg: &str, _opts: &CommonOpts, _config: &RunConfig) {
    fail("Debugger unavailable", "built without the `tui` feature");
}

fn run_self_test() {
    use std::io::Cursor;
    use wspace::{BigInt, ForeignRegistry, HostValue, Snapshot, Vm};
    use wspace::alphabet::{decode_number, encode_number};
    use wspace::vm::arith;

    println!("━━━ wspace Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let run = |source: &str, registry: ForeignRegistry| -> Option<Snapshot> {
        let program = wspace::assemble(source).ok()?.program;
        let mut vm = Vm::with_io(program, Cursor::new(Vec::new()), Vec::new()).with_foreign(registry);
        vm.run().ok()?;
        Some(vm.snapshot())
    };
    let state = |stack: &[i64], heap: &[(i64, i64)]| -> Snapshot {
        Snapshot::new(
            stack.iter().map(|v| BigInt::from(*v)).collect(),
            heap.iter().map(|(k, v)| (BigInt::from(*k), BigInt::from(*v))).collect(),
        )
    };

    let checks: Vec<(&str, bool)> = vec![
        (
            "Literal codec roundtrip",
            [-1000i64, -5, -1, 0, 1, 5, 1000].iter().all(|v| {
                let n = BigInt::from(*v);
                decode_number(&encode_number(&n)).ok() == Some(n)
            }),
        ),
        (
            "Floor division sign law",
            arith::floor_div(&BigInt::from(-7), &BigInt::from(2)).ok() == Some(BigInt::from(-4))
                && arith::floor_mod(&BigInt::from(-7), &BigInt::from(2)).ok() == Some(BigInt::from(1)),
        ),
        (
            "push 1; push 3; add",
            run("PUSH 1\nPUSH 3\nADD", ForeignRegistry::new()) == Some(state(&[4], &[])),
        ),
        (
            "push 1; push 2; store",
            run("PUSH 1\nPUSH 2\nSTORE", ForeignRegistry::new()) == Some(state(&[], &[(1, 2)])),
        ),
        (
            "store then retrieve",
            run("PUSH 3\nPUSH 1\nSTORE\nPUSH 3\nRETRIEVE", ForeignRegistry::new())
                == Some(state(&[1], &[(3, 1)])),
        ),
        (
            "Foreign multiply",
            run(
                "PUSH 3\nPUSH 2\nFFI 1",
                ForeignRegistry::new().with(1u32, "mul", 2, |a| Ok(HostValue::from(&a[0] * &a[1]))),
            )
            .and_then(|s| s.top().cloned())
                == Some(BigInt::from(6)),
        ),
        (
            "Forward label reference",
            run("JUMP 1\nPUSH 9\nMARK 1\nPUSH 7", ForeignRegistry::new()) == Some(state(&[7], &[])),
        ),
        (
            "Disassembly reassembles",
            wspace::assemble("PUSH -3\nMARK 2\nCALL 2\nPUSHS \"ok\"\nEND")
                .ok()
                .and_then(|a| {
                    let again = wspace::assemble(&wspace::disassemble(&a.program)).ok()?;
                    Some(again.program == a.program)
                })
                .unwrap_or(false),
        ),
    ];

    for (name, ok) in checks {
        print!("{}... ", name);
        if ok {
            println!("✓");
            passed += 1;
        } else {
            println!("✗");
            failed += 1;
        }
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
