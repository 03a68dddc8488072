use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::category::Category;
use crate::config::{CrawlConfig, YearRange};
use crate::gaps::{collected_pairs, detect_gaps, GapReport};
use crate::record::{NationalSquadRecord, SquadRecord};
use crate::seed::{load_seed_file, sort_by_page, SeedKind};
use crate::{derive, emit, info_time, process, request, Error, Result};

#[derive(Debug, Parser)]
#[command(name = "squad_scrape", version, about = "Crawl team statistics and derive cross-dataset fields")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags layered over the optional JSON config file.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// JSON config file; missing keys use defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// First season, inclusive.
    #[arg(long, global = true)]
    pub years_start: Option<i32>,
    /// Last season, exclusive.
    #[arg(long, global = true)]
    pub years_end: Option<i32>,
    /// Requests in flight at once.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape the ranking listings into a seed file.
    Seeds {
        #[arg(long, value_enum)]
        kind: SeedKind,
        #[arg(long)]
        out: PathBuf,
        /// Number of listing pages; defaults to the known page count.
        #[arg(long)]
        pages: Option<u32>,
    },
    /// Crawl one category for every seed entity.
    Crawl {
        #[arg(long, value_enum)]
        category: Category,
        #[arg(long)]
        seeds: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Gap report; only the seasons it lists are crawled.
        #[arg(long)]
        missing: Option<PathBuf>,
    },
    /// Report the seasons a yearly category output lacks per entity.
    Gaps {
        #[arg(long, value_enum)]
        category: Category,
        #[arg(long)]
        records: PathBuf,
        #[arg(long)]
        seeds: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Attach NationalPlayersCount to club squad records.
    NationalCount {
        #[arg(long)]
        clubs: PathBuf,
        #[arg(long)]
        national: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Attach TeamSizeRatio to club squad records.
    SizeRatio {
        #[arg(long)]
        clubs: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<CrawlConfig> {
        let mut config = match &self.config {
            Some(path) => CrawlConfig::from_file(path)?,
            None => CrawlConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        config.years = YearRange::new(
            self.years_start.unwrap_or(config.years.start),
            self.years_end.unwrap_or(config.years.end),
        );
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        config.validate()?;
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.overrides.resolve()?;
    match cli.command {
        Command::Seeds { kind, out, pages } => {
            let mut entities = process::collect_seeds(&config, kind, pages).await?;
            sort_by_page(&mut entities);
            emit::write_json_array(out, &entities).await
        }
        Command::Crawl {
            category,
            seeds,
            out,
            missing,
        } => {
            let entities = load_seed_file(&seeds, category.seed_kind()).await?;
            let targets = match missing {
                Some(path) => {
                    let gaps: Vec<GapReport> = emit::read_json_array(path).await?;
                    request::enumerate_gaps(&entities, category, &gaps, &config.base_url)
                }
                None => request::enumerate_all(&entities, category, config.years, &config.base_url),
            };
            let outcome = process::crawl(&config, targets).await?;
            emit::write_records(out, outcome.records).await
        }
        Command::Gaps {
            category,
            records,
            seeds,
            out,
        } => {
            if !category.is_yearly() {
                return Err(Error::Config(format!(
                    "{category:?} records carry no season, gaps only apply to yearly categories"
                )));
            }
            let records: Vec<Value> = emit::read_json_array(records).await?;
            let entities = load_seed_file(&seeds, category.seed_kind()).await?;
            let gaps = detect_gaps(&collected_pairs(&records), &entities, config.years);
            info_time!("{} of {} entities have gaps", gaps.len(), entities.len());
            emit::write_json_array(out, &gaps).await
        }
        Command::NationalCount {
            clubs,
            national,
            out,
        } => {
            let clubs: Vec<SquadRecord> = emit::read_json_array(clubs).await?;
            let nationals: Vec<NationalSquadRecord> = emit::read_json_array(national).await?;
            let clubs = derive::attach_national_counts(clubs, &nationals);
            emit::write_json_array(out, &clubs).await
        }
        Command::SizeRatio { clubs, out } => {
            let clubs: Vec<SquadRecord> = emit::read_json_array(clubs).await?;
            let clubs = derive::attach_size_ratios(clubs);
            emit::write_json_array(out, &clubs).await
        }
    }
}
