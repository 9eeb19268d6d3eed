//! Argument parsing for the Munge and BTR entry points.
//!
//! These are the flags handed through by the outer command dispatcher; a
//! malformed flag is fatal for the invoking handler.

use seqtune_error::{Result, TuneError};

/// Parsed Munge flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MungeArgs {
    /// `-L<N>`: start the length sweep at `N`.
    pub start_length: Option<u32>,
    /// `-restore`: resume from the checkpoint for this max length.
    pub restore: bool,
    /// `--require-all`: ids every sequence must contain.
    pub require_all: Vec<u8>,
    /// `--no-repeat`: ids that may appear at most once.
    pub no_repeat: Vec<u8>,
    /// `--exclude`: ids dropped from the pool.
    pub exclude: Vec<u8>,
    /// `--no-cutlist`: skip cutlist pruning.
    pub no_cutlist: bool,
    /// `--remove-inverse`: prune one member of each inverse pair.
    pub remove_inverse: bool,
}

/// Parsed BTR flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtrArgs {
    /// `--max-rounds`: global-rounds ceiling.
    pub max_rounds: u32,
    /// `--starting-round`: first global-rounds value; defaults to the input
    /// type's preferred value.
    pub starting_round: Option<u32>,
}

impl Default for BtrArgs {
    fn default() -> Self {
        Self {
            max_rounds: 9,
            starting_round: None,
        }
    }
}

pub fn parse_munge_args(args: &[String]) -> Result<MungeArgs> {
    let mut parsed = MungeArgs::default();
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-restore" => parsed.restore = true,
            "--no-cutlist" => parsed.no_cutlist = true,
            "--remove-inverse" => parsed.remove_inverse = true,
            "--require-all" => parsed.require_all = parse_id_list(take_value(arg, &mut iter)?)?,
            "--no-repeat" => parsed.no_repeat = parse_id_list(take_value(arg, &mut iter)?)?,
            "--exclude" => parsed.exclude = parse_id_list(take_value(arg, &mut iter)?)?,
            other if other.starts_with("-L") => {
                let n: u32 = other[2..]
                    .parse()
                    .map_err(|_| TuneError::parse(format!("bad length in {other:?}")))?;
                if n == 0 {
                    return Err(TuneError::parse("-L0 is not a valid start length"));
                }
                parsed.start_length = Some(n);
            }
            other => {
                if let Some((flag, value)) = other.split_once('=') {
                    match flag {
                        "--require-all" => parsed.require_all = parse_id_list(value)?,
                        "--no-repeat" => parsed.no_repeat = parse_id_list(value)?,
                        "--exclude" => parsed.exclude = parse_id_list(value)?,
                        _ => return Err(TuneError::parse(format!("unknown flag: {other}"))),
                    }
                } else {
                    return Err(TuneError::parse(format!("unknown flag: {other}")));
                }
            }
        }
    }
    Ok(parsed)
}

pub fn parse_btr_args(args: &[String]) -> Result<BtrArgs> {
    let mut parsed = BtrArgs::default();
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--max-rounds" => parsed.max_rounds = parse_u32(take_value(arg, &mut iter)?)?,
            "--starting-round" => {
                parsed.starting_round = Some(parse_u32(take_value(arg, &mut iter)?)?);
            }
            other => {
                if let Some((flag, value)) = other.split_once('=') {
                    match flag {
                        "--max-rounds" => parsed.max_rounds = parse_u32(value)?,
                        "--starting-round" => parsed.starting_round = Some(parse_u32(value)?),
                        _ => return Err(TuneError::parse(format!("unknown flag: {other}"))),
                    }
                } else {
                    return Err(TuneError::parse(format!("unknown flag: {other}")));
                }
            }
        }
    }
    if parsed.max_rounds == 0 {
        return Err(TuneError::parse("--max-rounds must be >= 1"));
    }
    Ok(parsed)
}

fn take_value<'a, I>(flag: &str, iter: &mut std::iter::Peekable<I>) -> Result<&'a str>
where
    I: Iterator<Item = &'a String>,
{
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| TuneError::parse(format!("{flag} requires a value")))
}

fn parse_u32(value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| TuneError::parse(format!("bad number: {value:?}")))
}

/// Comma-separated ids with inclusive ranges: `1,2,5-8`.
fn parse_id_list(value: &str) -> Result<Vec<u8>> {
    let mut ids = Vec::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((lo, hi)) = part.split_once('-') {
            let lo: u8 = lo
                .trim()
                .parse()
                .map_err(|_| TuneError::parse(format!("bad id range: {part:?}")))?;
            let hi: u8 = hi
                .trim()
                .parse()
                .map_err(|_| TuneError::parse(format!("bad id range: {part:?}")))?;
            if lo > hi {
                return Err(TuneError::parse(format!("inverted id range: {part:?}")));
            }
            ids.extend(lo..=hi);
        } else {
            ids.push(
                part.parse()
                    .map_err(|_| TuneError::parse(format!("bad id: {part:?}")))?,
            );
        }
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn munge_flags_parse_together() {
        let args = strings(&[
            "-L3",
            "-restore",
            "--require-all",
            "10,12-14",
            "--no-repeat=20",
            "--exclude",
            "11",
            "--no-cutlist",
            "--remove-inverse",
        ]);
        let parsed = parse_munge_args(&args).unwrap();
        assert_eq!(parsed.start_length, Some(3));
        assert!(parsed.restore);
        assert_eq!(parsed.require_all, vec![10, 12, 13, 14]);
        assert_eq!(parsed.no_repeat, vec![20]);
        assert_eq!(parsed.exclude, vec![11]);
        assert!(parsed.no_cutlist);
        assert!(parsed.remove_inverse);
    }

    #[test]
    fn bad_flags_are_parse_errors() {
        assert!(parse_munge_args(&strings(&["-Lx"])).is_err());
        assert!(parse_munge_args(&strings(&["--require-all"])).is_err());
        assert!(parse_munge_args(&strings(&["--require-all", "5-2"])).is_err());
        assert!(parse_munge_args(&strings(&["--frobnicate"])).is_err());
        assert!(parse_munge_args(&strings(&["-L0"])).is_err());
    }

    #[test]
    fn btr_defaults_and_overrides() {
        let parsed = parse_btr_args(&[]).unwrap();
        assert_eq!(parsed.max_rounds, 9);
        assert_eq!(parsed.starting_round, None);

        let parsed =
            parse_btr_args(&strings(&["--max-rounds", "5", "--starting-round=3"])).unwrap();
        assert_eq!(parsed.max_rounds, 5);
        assert_eq!(parsed.starting_round, Some(3));

        assert!(parse_btr_args(&strings(&["--max-rounds", "0"])).is_err());
    }
}
