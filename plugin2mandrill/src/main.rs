use clap::Parser;
use std::path::PathBuf;

/// Convert Assembly plugin XML into Mandrill tag definition source
#[derive(Parser)]
#[clap(author, version, about)]
#[clap(after_help = AFTER_HELP)]
struct Cli {
    /// Path to the plugin XML to convert
    #[clap(name = "INPUT_FILE")]
    input_file: PathOrStdin,
    /// Path to write the generated tag definitions to
    #[clap(name = "OUTPUT_FILE")]
    output_file: PathOrStdout,
}

const AFTER_HELP: &str = "\
Examples:

  $ plugin2mandrill chud_globals_definition.xml chud_globals_definition.c
  $ plugin2mandrill chud_globals_definition.xml -
";

#[derive(Clone, Debug)]
enum PathOrStdin {
    StdIn,
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(src: &str) -> Result<PathOrStdin, std::convert::Infallible> {
        match src {
            "-" => Ok(PathOrStdin::StdIn),
            _ => Ok(PathOrStdin::Path(PathBuf::from(src))),
        }
    }
}

#[derive(Clone, Debug)]
enum PathOrStdout {
    StdOut,
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdout {
    type Err = std::convert::Infallible;

    fn from_str(src: &str) -> Result<PathOrStdout, std::convert::Infallible> {
        match src {
            "-" => Ok(PathOrStdout::StdOut),
            _ => Ok(PathOrStdout::Path(PathBuf::from(src))),
        }
    }
}

fn unwrap_or_exit<T>(option: Option<T>) -> T {
    option.unwrap_or_else(|| std::process::exit(plugin2mandrill::Status::Error.exit_code()))
}

fn main() -> ! {
    let Cli {
        input_file,
        output_file,
    } = Cli::parse();

    let mut driver = plugin2mandrill::Driver::new();
    driver.install_panic_hook();

    let file_id = unwrap_or_exit(match input_file {
        PathOrStdin::StdIn => driver.load_source("<stdin>".to_owned(), std::io::stdin()),
        PathOrStdin::Path(path) => driver.load_source_path(&path),
    });

    match output_file {
        // The driver already emits to stdout by default
        PathOrStdout::StdOut => {}
        PathOrStdout::Path(path) => unwrap_or_exit(driver.set_emit_path(&path)),
    }

    let status = driver.convert_and_emit(file_id);
    std::process::exit(status.exit_code());
}
