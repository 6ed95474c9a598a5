use {
    argh::FromArgs,
    liso::{liso, Response},
    loxide::{interpreter::Interpreter, output::Output, report},
    miette::{bail, IntoDiagnostic, Result, WrapErr},
};

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Execute a Lox script or run a REPL.
#[derive(FromArgs)]
struct Args {
    /// print version information
    #[argh(switch, short = 'V')]
    version: bool,

    /// script file
    #[argh(positional)]
    script: Vec<String>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    if args.version {
        println!("{} {}", APP_NAME, APP_VERSION);
        return Ok(());
    }

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .into_diagnostic()?;

    if args.script.len() > 1 {
        bail!("Usage: {APP_NAME} [script file]");
    }

    match args.script.first() {
        Some(script) => run_script(script)?,
        None => run_repl(),
    }
    Ok(())
}

fn run_script(script: &str) -> Result<()> {
    let contents = std::fs::read_to_string(script)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read script file '{script}'"))?;

    let mut interpreter = Interpreter::new(Output::Standard);
    if let Err(e) = loxide::run(&mut interpreter, &contents, 0) {
        report::runtime_error(&e);
    }

    if report::had_error() {
        std::process::exit(65);
    }
    if report::had_runtime_error() {
        std::process::exit(70);
    }
    Ok(())
}

fn run_repl() {
    let mut io = liso::InputOutput::new();
    let mut interpreter = Interpreter::new(Output::Repl(io.clone_output()));
    interpreter.is_repl = true;

    // Growing offset keeps token spans unique across the session, which is
    // what the interpreter's side table is keyed on.
    let mut scan_offset = 0;

    io.prompt(liso!(fg = green, bold, "> ", reset), true, false);
    loop {
        match io.read_blocking() {
            Response::Input(line) => {
                if line.is_empty() {
                    break;
                }
                io.echoln(liso!(fg = green, dim, "> ", fg = none, line.as_str()));
                if let Err(e) = loxide::run(&mut interpreter, &line, scan_offset) {
                    report::runtime_error(&e);
                }
                scan_offset += line.len() + 1;
                // Diagnostics are per-line in interactive use.
                report::clear();
            }
            Response::Discarded(line) => {
                io.echoln(liso!(bold + dim, "X ", -bold, line));
            }
            Response::Dead | Response::Quit | Response::Finish => break,
            _ => {}
        }
    }
}
