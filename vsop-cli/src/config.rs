//! Run options from the command line
//!
//! Flags follow the `virsort2_sop` script so existing invocations keep working.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use vsop_core::domain::config::RunOptions;

/// Options accepted by `vsop run`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Contig FASTA file
    #[arg(short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// CheckV database directory
    #[arg(short = 'd', long = "db-dir", env = "CHECKVDB", value_name = "DIR")]
    pub db_dir: Option<PathBuf>,

    /// Viral groups to include, comma separated
    #[arg(long = "include-groups", default_value = "dsDNAphage,ssDNA")]
    pub include_groups: String,

    /// Minimal score to be identified as viral
    #[arg(long = "min-score", default_value_t = 0.5)]
    pub min_score: f64,

    /// Minimal sequence length; shorter sequences are removed
    #[arg(long = "min-length", default_value_t = 1500)]
    pub min_length: u64,

    /// Number of CPU threads, 0 for every logical processor
    #[arg(short = 't', long = "num-cpu-threads", default_value_t = 0)]
    pub num_cpu_threads: usize,

    /// Number of parts the input is split into
    #[arg(short = 'n', default_value_t = 10)]
    pub num_parts: u32,

    /// Output directory
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Output prefix, e.g. the sample name
    #[arg(short = 'p', long = "out-prefix")]
    pub out_prefix: Option<String>,

    /// Overwrite an existing output directory
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Keep all temporary files
    #[arg(long = "keep-tmp-files")]
    pub keep_tmp_files: bool,

    /// Base directory for temporary files
    #[arg(long = "tmp-dir", value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,

    /// Run a single VirSorter2 instance on the unsplit input
    #[arg(long = "no-split")]
    pub no_split: bool,

    /// Continue from the last checkpoint of the run in --out-dir
    #[arg(long = "continue")]
    pub continue_run: bool,
}

impl RunArgs {
    /// Converts the flags into run options
    ///
    /// Input paths are made absolute so a resumed run does not depend on the
    /// working directory it is started from.
    pub fn to_options(&self, verbose: bool) -> Result<RunOptions> {
        let absolute = |path: &PathBuf| {
            std::path::absolute(path)
                .with_context(|| format!("Failed to resolve path {}", path.display()))
        };

        Ok(RunOptions {
            input_contigs: self.input.as_ref().map(absolute).transpose()?,
            db_dir: self.db_dir.as_ref().map(absolute).transpose()?,
            out_dir: self.out_dir.clone(),
            out_prefix: self.out_prefix.clone(),
            temp_base: self.tmp_dir.as_ref().map(absolute).transpose()?,
            keep_tmp_files: self.keep_tmp_files,
            force_overwrite: self.force,
            split_input: !self.no_split,
            num_parts: self.num_parts,
            min_length: self.min_length,
            min_score: self.min_score,
            viral_groups: self
                .include_groups
                .split(',')
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            num_threads: self.num_cpu_threads,
            verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(argv: &[&str]) -> RunArgs {
        Harness::try_parse_from(std::iter::once("vsop").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_defaults_match_run_options() {
        let options = parse(&["-i", "contigs.fa", "-d", "/db"])
            .to_options(false)
            .unwrap();
        let defaults = RunOptions::default();

        assert_eq!(options.viral_groups, defaults.viral_groups);
        assert_eq!(options.min_score, defaults.min_score);
        assert_eq!(options.min_length, defaults.min_length);
        assert_eq!(options.num_parts, defaults.num_parts);
        assert_eq!(options.num_threads, 0);
        assert!(options.split_input);
        assert!(options.input_contigs.unwrap().is_absolute());
    }

    #[test]
    fn test_all_flags() {
        let args = parse(&[
            "-i",
            "contigs.fa",
            "--db-dir",
            "/db",
            "--include-groups",
            "dsDNAphage,NCLDV,",
            "--min-score",
            "0.7",
            "--min-length",
            "3000",
            "-t",
            "8",
            "-n",
            "4",
            "-o",
            "out",
            "-p",
            "lake",
            "-f",
            "--keep-tmp-files",
            "--tmp-dir",
            "/scratch",
            "--no-split",
            "--continue",
        ]);
        assert!(args.continue_run);

        let options = args.to_options(true).unwrap();
        assert_eq!(options.viral_groups, vec!["dsDNAphage", "NCLDV"]);
        assert_eq!(options.min_score, 0.7);
        assert_eq!(options.min_length, 3000);
        assert_eq!(options.num_threads, 8);
        assert_eq!(options.num_parts, 4);
        assert_eq!(options.out_dir, Some(PathBuf::from("out")));
        assert_eq!(options.out_prefix.as_deref(), Some("lake"));
        assert_eq!(options.temp_base, Some(PathBuf::from("/scratch")));
        assert!(options.force_overwrite);
        assert!(options.keep_tmp_files);
        assert!(!options.split_input);
        assert!(options.verbose);
    }

    #[test]
    fn test_rejects_non_numeric_threads() {
        let result = Harness::try_parse_from(["vsop", "-t", "many"]);
        assert!(result.is_err());
    }
}
