//! Sample command - check how traffic splits across weighted backends

use std::str::FromStr;

use clap::Args;
use routecheck_common::settings::SAMPLES_ENV;
use routecheck_probe::{by_status, DistributionSampler, StatusKey, ToleranceBand};

use super::{PollArgs, TargetArgs};
use crate::{Error, Result};

/// A status key and the band its count must fall in, e.g. `201=40..60`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBand {
    pub key: StatusKey,
    pub band: ToleranceBand,
}

impl FromStr for KeyBand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (key, band) = s
            .split_once('=')
            .ok_or_else(|| format!("band '{s}' must be KEY=LO..HI"))?;
        Ok(Self {
            key: key.trim().parse().map_err(|e| format!("{e}"))?,
            band: band.trim().parse().map_err(|e| format!("{e}"))?,
        })
    }
}

/// Sample an endpoint and check the status distribution
#[derive(Args, Debug)]
pub struct SampleArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Number of requests to issue
    #[arg(long, env = SAMPLES_ENV, default_value_t = 100)]
    pub samples: usize,

    /// Expected count band per status, as STATUS=LO..HI (repeatable)
    #[arg(long = "band")]
    pub bands: Vec<KeyBand>,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Reject two bands for the same key, which cannot both be honoured
fn check_bands(bands: &[KeyBand]) -> Result<()> {
    for (i, kb) in bands.iter().enumerate() {
        if bands[..i].iter().any(|earlier| earlier.key == kb.key) {
            return Err(Error::validation(format!(
                "--band given twice for {}",
                kb.key
            )));
        }
    }
    Ok(())
}

/// Run the sample command
pub async fn run(args: SampleArgs) -> Result<()> {
    check_bands(&args.bands)?;
    let settings = args.poll.settings()?;
    let sampler = DistributionSampler::new(args.target.client(&settings)?);

    let sample = sampler
        .sample(&args.target.target(), args.samples, by_status)
        .await?;
    println!("{sample}");

    sample.verify(args.bands.iter().map(|b| (&b.key, &b.band)))?;
    Ok(())
}
