use clap::{ArgAction, Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use brine_jsgen_compiler::error::JsgenError;
use brine_jsgen::{
    build_registry, compile_paths, models_to_json, restringify, GenerateOptions, DEFAULT_EXTENSION,
    DEFAULT_OUTPUT,
};

#[derive(Parser)]
#[command(name = "jsgen")]
#[command(about = "Generate JSON parse/stringify C code from annotated C structs", long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG still applies.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one C unit with the parse/stringify functions of every
    /// annotated struct found in the inputs
    Gen {
        /// Header files, or directories scanned (non-recursively) for headers
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Extension of the files picked up from directories
        #[arg(long, default_value = DEFAULT_EXTENSION)]
        ext: String,

        /// Reject arrays without a sized_by counter
        #[arg(long)]
        strict: bool,
    },

    /// Print the extracted models as JSON
    Models {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long, default_value = DEFAULT_EXTENSION)]
        ext: String,
    },

    /// Parse a JSON document as one of the models and print it back out the
    /// way the generated stringify function would
    Check {
        #[arg(required = true)]
        headers: Vec<PathBuf>,

        /// Name used in the generated functions, e.g. `User` or `role`
        #[arg(short, long)]
        model: String,

        /// JSON document to read
        #[arg(short, long)]
        json: PathBuf,

        /// Spaces per nesting level in the output, 0 for compact
        #[arg(long, default_value_t = 0)]
        indent: usize,

        /// The document is an array of records
        #[arg(long)]
        list: bool,

        #[arg(long, default_value = DEFAULT_EXTENSION)]
        ext: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn options(ext: &str, strict: bool) -> GenerateOptions {
    GenerateOptions {
        extension: ext.trim_start_matches('.').to_string(),
        strict,
    }
}

fn generate(inputs: &[PathBuf], output: &Path, options: &GenerateOptions) -> Result<usize, JsgenError> {
    let (registry, code) = compile_paths(inputs, options)?;
    fs::write(output, code)?;
    info!("wrote {} bytes to {}", fs::metadata(output)?.len(), output.display());
    Ok(registry.len())
}

fn check(
    headers: &[PathBuf],
    options: &GenerateOptions,
    model:   &str,
    json:    &Path,
    indent:  usize,
    list:    bool,
) -> Result<String, JsgenError> {
    let registry = build_registry(headers, options)?;
    let text = fs::read_to_string(json)?;
    restringify(&registry, model, &text, indent, list)
}

fn main() -> Result<(), JsgenError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Gen { inputs, output, ext, strict } => {
            let count = generate(inputs, output, &options(ext, *strict))?;
            println!("Generated {} models → {}", count, output.display());
            Ok(())
        }

        Commands::Models { inputs, ext } => {
            let registry = build_registry(inputs, &options(ext, false))?;
            println!("{}", models_to_json(&registry)?);
            Ok(())
        }

        Commands::Check { headers, model, json, indent, list, ext } => {
            let output = check(headers, &options(ext, false), model, json, *indent, *list)?;
            println!("{}", output);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"
        JSON typedef struct {
            int id;
            bool is_active alias("active");
            int tags[4];
        } User;
    "#;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["jsgen", "-vv", "gen", "include", "extra.h", "--strict"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Gen { inputs, output, ext, strict } => {
                assert_eq!(inputs, [PathBuf::from("include"), PathBuf::from("extra.h")]);
                assert_eq!(output, PathBuf::from("models.g.h"));
                assert_eq!(ext, "h");
                assert!(strict);
            }
            _ => panic!("expected the gen subcommand"),
        }

        assert!(Cli::try_parse_from(["jsgen", "gen"]).is_err());
        assert!(Cli::try_parse_from(["jsgen", "check", "a.h", "--json", "x.json"]).is_err());
    }

    #[test]
    fn test_options_strip_leading_dot() {
        assert_eq!(options(".hpp", true), GenerateOptions { extension: "hpp".into(), strict: true });
    }

    #[test]
    fn test_generate_writes_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("user.h"), HEADER).unwrap();
        let output = temp_dir.path().join("out").with_extension("g.h");

        let count = generate(&[temp_dir.path().to_path_buf()], &output, &options("h", false)).unwrap();
        assert_eq!(count, 1);
        let code = fs::read_to_string(&output).unwrap();
        assert!(code.contains("int parse_User(const char *json, User *out, JsGenAllocator *a) {"));

        let strict = generate(&[temp_dir.path().to_path_buf()], &output, &options("h", true));
        assert!(matches!(strict, Err(JsgenError::VerifierError(_))));
    }

    #[test]
    fn test_check_restringifies() {
        let temp_dir = tempfile::tempdir().unwrap();
        let header = temp_dir.path().join("user.h");
        let json = temp_dir.path().join("user.json");
        fs::write(&header, HEADER).unwrap();
        fs::write(&json, r#"{"active": true, "id": 3, "tags": [1, 2], "other": null}"#).unwrap();

        let output = check(&[header], &options("h", false), "User", &json, 0, false).unwrap();
        assert_eq!(output, r#"{"id": 3,"active": true,"tags": []}"#);
    }
}
