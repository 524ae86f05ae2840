//! `protomap`: inspect schema documents and convert messages between
//! binary and JSON form

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod commands;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::MapperArgs;

fn schema_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("schema")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Schema document (YAML, or JSON by extension)"),
    )
    .arg(
        Arg::new("message")
            .required(true)
            .help("Fully qualified message name"),
    )
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Mapper config (TOML, or YAML by extension)")
}

fn cli() -> Command {
    Command::new("protomap")
        .version(protomap_core::VERSION)
        .about("Immutable, map-like access to schema-described binary messages")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level unless RUST_LOG is set"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(schema_args(Command::new("deps").about("Show generation order and recursive groups")))
        .subcommand(
            schema_args(Command::new("describe").about("Show the generated key table of a message")).arg(config_arg()),
        )
        .subcommand(
            schema_args(Command::new("decode").about("Decode a binary message to JSON"))
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Binary message file"),
                )
                .arg(config_arg())
                .arg(
                    Arg::new("elide-defaults")
                        .long("elide-defaults")
                        .action(ArgAction::SetTrue)
                        .help("Omit fields holding their type default"),
                ),
        )
        .subcommand(
            schema_args(Command::new("encode").about("Encode a JSON document as a binary message"))
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON document"),
                )
                .arg(
                    Arg::new("output")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Binary output file"),
                )
                .arg(config_arg()),
        )
}

fn init_tracing(matches: &ArgMatches) {
    let default = if matches.get_flag("verbose") { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if matches.get_flag("log-json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .ok_or_else(|| anyhow::anyhow!("missing argument <{name}>"))
}

fn message(args: &ArgMatches) -> Result<&str> {
    args.get_one::<String>("message")
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing argument <message>"))
}

fn mapper_args(args: &ArgMatches) -> MapperArgs<'_> {
    MapperArgs {
        config: args.get_one::<PathBuf>("config").map(PathBuf::as_path),
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("deps", args)) => {
            print!("{}", commands::deps(path(args, "schema")?, message(args)?)?);
        }
        Some(("describe", args)) => {
            print!("{}", commands::describe(path(args, "schema")?, message(args)?, &mapper_args(args))?);
        }
        Some(("decode", args)) => {
            let json = commands::decode(
                path(args, "schema")?,
                message(args)?,
                path(args, "input")?,
                args.get_flag("elide-defaults"),
                &mapper_args(args),
            )?;
            println!("{json}");
        }
        Some(("encode", args)) => {
            let output = path(args, "output")?;
            let written = commands::encode(
                path(args, "schema")?,
                message(args)?,
                path(args, "input")?,
                output,
                &mapper_args(args),
            )?;
            eprintln!("wrote {written} bytes to {}", output.display());
        }
        Some((other, _)) => anyhow::bail!("unknown command {other}"),
        None => anyhow::bail!("no command given"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(&matches);
    run(&matches)
}
