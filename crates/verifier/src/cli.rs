use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::debug;
use verifier_core::classes::open_classpath;
use verifier_core::verification::{verify_batch, VerificationTask};
use verifier_core::{
    Error, Ide, IdePlugin, IdeVersion, ReadMode, Result, VerificationEngine, VerificationResult,
    VerifierConfig,
};

/// Checks IDE plugins for binary compatibility with IDE builds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify one plugin against one IDE build
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Build number of the IDE, e.g. IU-143.1532
    #[arg(long)]
    pub ide_version: String,

    /// IDE class directory or archive; a directory also contributes the
    /// archives directly inside it
    #[arg(long)]
    pub ide_classpath: Vec<PathBuf>,

    /// JDK class directory or archive, resolved after the IDE
    #[arg(long)]
    pub jdk_classpath: Vec<PathBuf>,

    /// Plugin class directory or archive
    #[arg(long, required = true)]
    pub plugin: Vec<PathBuf>,

    #[arg(long)]
    pub plugin_id: String,

    /// First IDE build the plugin supports
    #[arg(long)]
    pub since_build: String,

    /// Last IDE build the plugin supports
    #[arg(long)]
    pub until_build: Option<String>,

    /// Verifier options (.json, .toml, .yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Loads the inputs named on the command line and verifies the plugin.
pub async fn run_check(args: CheckArgs) -> Result<VerificationResult> {
    let ide_version = IdeVersion::parse(&args.ide_version)?;
    let since_build = IdeVersion::parse(&args.since_build)?;
    let until_build = args
        .until_build
        .as_deref()
        .map(IdeVersion::parse)
        .transpose()?;

    let config = match &args.config {
        Some(path) => VerifierConfig::load(path)?,
        None => VerifierConfig::default(),
    };
    debug!("Using {:?}", config);

    let platform = open_classpath(&args.ide_classpath, ReadMode::Signatures)?;
    let ide = Ide::new(ide_version, platform, Vec::new());

    let mut builder = IdePlugin::builder(&args.plugin_id, since_build)
        .classpath(open_classpath(&args.plugin, ReadMode::Full)?);
    if let Some(until_build) = until_build {
        builder = builder.until_build(until_build);
    }
    let plugin = Arc::new(builder.build());

    let mut engine = VerificationEngine::new(config);
    if !args.jdk_classpath.is_empty() {
        engine = engine.with_jdk(open_classpath(&args.jdk_classpath, ReadMode::Signatures)?);
    }

    let task = VerificationTask::new(plugin, ide);
    verify_batch(Arc::new(engine), vec![task])
        .await
        .into_iter()
        .next()
        .ok_or_else(|| Error::Other("verification produced no result".to_string()))
}

pub fn print_result(result: &VerificationResult) {
    println!(
        "{} against {}: {}",
        result.plugin_id, result.target_version, result.verdict
    );
    for problem in &result.problems {
        println!("  {}", problem);
    }
    for missing in &result.missing_dependencies {
        println!("  Missing dependency: {}", missing.reason);
    }
}
