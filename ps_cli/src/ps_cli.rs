// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use clap::Parser;

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// List the configured processes.
    Processes {},
    /// Parse a JSON request document and print its inputs.
    Parse { request_file: String },
    /// Store a file and print the JSON data reference pointing to it.
    Store {
        file: String,
        #[arg(long, default_value_t = String::from("application/octet-stream"))]
        mime_type: String,
    },
}

#[derive(Debug, clap::Parser)]
#[command(long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
    #[arg(short, long, default_value_t = String::from("ps.toml"))]
    config_file: String,
    /// Write a configuration template to this path and quit.
    #[arg(short, long, default_value_t = String::from(""))]
    template: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    if !args.template.is_empty() {
        return ps_cli::create_template(&args.template, ps_cli::ps_cli_default_conf().as_str());
    }

    let settings = ps_cli::PsSettings::from_file(&args.config_file)?;
    log::debug!("Settings: {:?}", settings);
    let ctx = settings.context()?;
    let async_runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(2).enable_all().build()?;

    match args.command {
        None => log::debug!("Bye"),
        Some(Commands::Processes {}) => {
            for identifier in ctx.catalog.process_identifiers() {
                if let Some(process) = ctx.catalog.get_process(&identifier) {
                    println!("{}", ps_cli::describe_process(&process));
                }
            }
        }
        Some(Commands::Parse { request_file }) => {
            let bytes = std::fs::read(&request_file)?;
            let request = async_runtime.block_on(ps_handler::RequestDeserializer::new(&ctx).deserialize(&bytes))?;
            match ctx.catalog.get_process(&request.process_identifier) {
                Some(process) => println!("{}", ps_cli::describe_request(&request, &process)),
                None => anyhow::bail!("unknown process {}", request.process_identifier),
            }
        }
        Some(Commands::Store { file, mime_type }) => {
            let bytes = std::fs::read(&file)?;
            let href = async_runtime.block_on(ctx.storage.store(bytes, &mime_type))?;
            let reference = serde_json::json!({"DataReference": {"href": href, "mimeType": mime_type}});
            println!("{}", serde_json::to_string_pretty(&reference)?);
        }
    }

    Ok(())
}
