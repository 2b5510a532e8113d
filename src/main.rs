use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use oneproto::{options::DEFAULT_EXTENDS_OPTION, Transpiler};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// The directories to search for `.proto` files.
    #[arg(value_name = "DIRS", required = true)]
    inputs: Vec<PathBuf>,
    /// A file whose contents are written at the start of the output.
    #[arg(short = 'T', long = "template", value_name = "PATH")]
    template: Option<PathBuf>,
    /// The directories relative to which input files are opened. Defaults to the input directories.
    #[arg(
        short = 'I',
        long = "include",
        visible_alias = "proto_path",
        value_name = "PATH"
    )]
    includes: Vec<PathBuf>,
    /// The path to write the merged schema to.
    #[arg(short = 'O', long = "output", value_name = "PATH")]
    output: PathBuf,
    /// The package written at the top level of the output.
    #[arg(short = 'P', long = "package", value_name = "NAME")]
    package: String,
    /// If set, messages also inherit the options of the messages they extend.
    #[arg(long)]
    inherit_options: bool,
    /// The name of the option used to inherit fields from another message.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_EXTENDS_OPTION)]
    extends_option: String,
    /// Encoded file descriptor sets whose files are merged along with the input directories.
    #[arg(long = "descriptor-set", value_name = "PATH")]
    descriptor_sets: Vec<PathBuf>,
}

pub fn main() -> Result<()> {
    miette::set_panic_hook();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let includes = if args.includes.is_empty() {
        args.inputs.clone()
    } else {
        args.includes
    };

    let mut transpiler = Transpiler::new(&includes, &args.package);
    transpiler
        .inherit_options(args.inherit_options)
        .extends_option(args.extends_option);
    if let Some(template) = &args.template {
        transpiler.template_file(template)?;
    }

    for input in &args.inputs {
        transpiler.open_dir(input)?;
    }
    for path in &args.descriptor_sets {
        let bytes = fs::read(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read '{}'", path.display()))?;
        transpiler.decode_file_descriptor_set(bytes.as_slice())?;
    }

    let schema = transpiler.generate()?;
    write_output(&args.output, &schema)?;

    tracing::info!(
        files = transpiler.files().len(),
        output = %args.output.display(),
        "wrote merged schema"
    );
    Ok(())
}

fn write_output(path: &Path, schema: &str) -> Result<()> {
    fs::write(path, schema)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write '{}'", path.display()))
}
