//! `hb`: command-line interface for HammerBlade address translation.
//!
//! ```text
//! USAGE:
//!   hb policies                          List striping policies
//!   hb config                            Print the configuration and derived geometry
//!   hb rom-ids                           Print the configuration ROM layout
//!   hb translate <EVA> [--src X,Y]       EVA -> NPA
//!   hb reverse <X> <Y> <EPA> [--tgt X,Y] NPA -> EVA
//!   hb size <EVA>                        Contiguous bytes from an EVA
//!   hb selftest [--all]                  Round-trip every DRAM bank of pod 0
//! ```
//!
//! Global options: `--config FILE` (TOML), `--policy NAME`, `-v`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hb_chip::rom::ConfigId;
use hb_chip::{Coordinate, Eva, McConfig, Npa};
use hb_driver::config::{load_config, render_config, rom_image};
use hb_driver::eva::{classify, classify_npa};
use hb_driver::{eva_size, eva_to_npa, npa_to_eva, verify_dram_npa, StripingPolicy};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hb", about = "HammerBlade EVA/NPA translation tool", version)]
struct Cli {
    /// Configuration file (TOML). Defaults to the canonical 16x8 pod.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Striping policy.
    #[arg(long, global = true, default_value = "default")]
    policy: StripingPolicy,

    /// Log translation steps.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List striping policies.
    Policies,
    /// Print the configuration and its derived geometry.
    Config,
    /// Print the configuration ROM layout for this configuration.
    RomIds,
    /// Translate an EVA to an NPA.
    Translate {
        /// EVA (hex with 0x prefix, or decimal).
        #[arg(value_parser = parse_u32)]
        eva: u32,
        /// Issuing tile, as X,Y. Defaults to the vcore origin.
        #[arg(long, value_parser = parse_coord)]
        src: Option<Coordinate>,
    },
    /// Translate an NPA back to an EVA.
    Reverse {
        /// Column.
        #[arg(value_parser = parse_u32)]
        x: u32,
        /// Row.
        #[arg(value_parser = parse_u32)]
        y: u32,
        /// Endpoint physical address.
        #[arg(value_parser = parse_u32)]
        epa: u32,
        /// Target tile, as X,Y. Defaults to the vcore origin.
        #[arg(long, value_parser = parse_coord)]
        tgt: Option<Coordinate>,
    },
    /// Contiguous bytes from an EVA.
    Size {
        /// EVA (hex with 0x prefix, or decimal).
        #[arg(value_parser = parse_u32)]
        eva: u32,
    },
    /// Round-trip every DRAM bank of pod 0 through the policy.
    Selftest {
        /// Check every policy, not just the selected one.
        #[arg(long)]
        all: bool,
    },
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let s = s.trim().replace('_', "");
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("`{s}`: {e}"))
}

fn parse_coord(s: &str) -> Result<Coordinate, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("`{s}`: expected X,Y"))?;
    Ok(Coordinate::new(parse_u32(x)?, parse_u32(y)?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let cfg = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => McConfig::default(),
    };
    let policy = cli.policy;

    match cli.command {
        Cmd::Policies => cmd_policies(policy),
        Cmd::Config => cmd_config(&cfg)?,
        Cmd::RomIds => cmd_rom_ids(&cfg),
        Cmd::Translate { eva, src } => {
            cmd_translate(&cfg, policy, src.unwrap_or(cfg.vcore_origin), Eva::new(eva))?;
        }
        Cmd::Reverse { x, y, epa, tgt } => {
            cmd_reverse(&cfg, policy, tgt.unwrap_or(cfg.vcore_origin), Npa::new(x, y, epa))?;
        }
        Cmd::Size { eva } => {
            println!("{}", eva_size(&cfg, policy, Eva::new(eva))?);
        }
        Cmd::Selftest { all } => {
            let policies = if all { StripingPolicy::ALL.to_vec() } else { vec![policy] };
            cmd_selftest(&cfg, &policies)?;
        }
    }

    Ok(())
}

fn cmd_policies(active: StripingPolicy) {
    for policy in StripingPolicy::ALL {
        let mark = if policy == active { '*' } else { ' ' };
        println!("{mark} {:<16} {}", policy.name(), policy.description());
    }
}

fn cmd_config(cfg: &McConfig) -> Result<()> {
    print!("{}", render_config(cfg)?);
    println!();
    println!("# derived");
    println!("# x_dimlog            = {}", cfg.x_dimlog());
    println!("# stripe              = {} B (log {})", cfg.dram_stripe_size(), cfg.dram_stripe_size_log());
    println!("# bank                = {} B ({} bits)", cfg.dram_bank_size(), cfg.dram_bitwidth());
    for pod in cfg.pod_coordinates() {
        println!(
            "# pod {pod}: vcores at {}, DRAM x [{}, {}], north y {}, south y {}",
            cfg.pod_vcore_origin(pod),
            cfg.dram_min_x_coord(pod),
            cfg.dram_max_x_coord(pod),
            cfg.pod_dram_north_y(pod),
            cfg.pod_dram_south_y(pod)
        );
    }
    Ok(())
}

fn cmd_rom_ids(cfg: &McConfig) {
    let words = rom_image(cfg);
    for id in ConfigId::ALL {
        println!("{:>2}  {:<45} 0x{:08x}", id.index(), id.name(), words[id.index()]);
    }
}

fn cmd_translate(cfg: &McConfig, policy: StripingPolicy, src: Coordinate, eva: Eva) -> Result<()> {
    let region = classify(eva);
    let (npa, size) = eva_to_npa(cfg, policy, src, eva)
        .with_context(|| format!("translating {region} EVA {eva} from {src}"))?;
    println!("EVA    {eva} ({region}, {policy})");
    println!("NPA    {npa}");
    println!("size   {size} B");
    Ok(())
}

fn cmd_reverse(cfg: &McConfig, policy: StripingPolicy, tgt: Coordinate, npa: Npa) -> Result<()> {
    let (eva, size) = npa_to_eva(cfg, policy, tgt, &npa)
        .with_context(|| format!("inverting NPA {npa} for {tgt}"))?;
    let kind = classify_npa(cfg, tgt, &npa).map_or_else(|| "?".to_string(), |k| k.to_string());
    println!("NPA    {npa} ({kind})");
    println!("EVA    {eva} ({policy})");
    println!("size   {size} B");
    Ok(())
}

fn cmd_selftest(cfg: &McConfig, policies: &[StripingPolicy]) -> Result<()> {
    const STRIPES: u32 = 4;
    let pod = Coordinate::new(0, 0);
    let tgt = cfg.pod_vcore_origin(pod);
    let stripe = cfg.dram_stripe_size();
    let rows = [cfg.pod_dram_north_y(pod), cfg.pod_dram_south_y(pod)];

    let mut failures = 0usize;
    for &policy in policies {
        let mut checked = 0usize;
        for y in rows {
            for x in cfg.dram_min_x_coord(pod)..=cfg.dram_max_x_coord(pod) {
                for epa in (0..STRIPES).map(|i| i * stripe) {
                    let npa = Npa::new(x, y, epa);
                    checked += 1;
                    if let Err(e) = verify_dram_npa(cfg, policy, tgt, &npa) {
                        failures += 1;
                        println!("FAIL {policy:<16} {npa}: {e}");
                    }
                }
            }
        }
        info!("{policy}: {checked} NPAs checked");
        println!("{policy:<16} {checked} NPAs round-tripped");
    }

    if failures > 0 {
        bail!("{failures} round-trip failures");
    }
    Ok(())
}
