//! Sequence codec: the one canonical string form for annotated sequences.
//!
//! Canonical shape:
//!
//! ```text
//! Name1(ID:i1)(TR:t1) -> Name2(ID:i2)(TR:t2) | (GR:g) (Mode:P)
//! ```
//!
//! Left of `|` are the steps; right of it the global-rounds annotation and
//! zero or more recognized attributes. Parsing is tolerant: ids may stand in
//! for names, `(ID:…)` may be omitted when the name resolves uniquely in the
//! registry, and absent rounds default to 1 unless the caller asks for
//! inference.

use seqtune_cipher::TransformRegistry;
use seqtune_error::{Result, TuneError};
use seqtune_types::{InputProfile, Sequence, SequenceStep};

// ---------------------------------------------------------------------------
// Options and formats
// ---------------------------------------------------------------------------

/// Attribute keys accepted on the right side of the bar. Anything else
/// fails with [`TuneError::UnknownAttribute`].
pub const RECOGNIZED_ATTRIBUTES: [&str; 7] = [
    "Mode",
    "InputType",
    "MaxSequenceLen",
    "MaxTR",
    "MaxGR",
    "RequiredPassCount",
    "ExitCount",
];

/// How much annotation [`format_profile`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    /// Names, ids, transform rounds, global rounds, and attributes.
    All,
    /// Names only.
    Bare,
    /// Names, ids, and transform rounds.
    IdTr,
    /// Names, ids, transform rounds, and global rounds.
    IdTrGr,
}

/// Parsing knobs. Defaults leave absent rounds at 1; the infer flags inject
/// the caller's values instead.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub infer_t_rounds: bool,
    pub infer_g_rounds: bool,
    /// Injected when `infer_t_rounds` is set and a step has no `(TR:…)`.
    pub inferred_tr: u8,
    /// Injected when `infer_g_rounds` is set and the tail has no `(GR:…)`.
    pub inferred_gr: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            infer_t_rounds: false,
            infer_g_rounds: false,
            inferred_tr: 1,
            inferred_gr: 1,
        }
    }
}

/// The result of parsing one canonical string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProfile {
    pub sequence: Sequence,
    pub global_rounds: u32,
    /// Recognized `(Key:value)` pairs from the attribute tail, in input
    /// order.
    pub attributes: Vec<(String, String)>,
}

impl ParsedProfile {
    #[must_use]
    pub fn into_profile(self, name: impl Into<String>) -> InputProfile {
        InputProfile::new(name, self.sequence, self.global_rounds)
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render a profile in the requested format.
///
/// Steps are joined with `" -> "`; `All`/`IdTrGr` append the global-rounds
/// tail, and `All` also appends `attributes` in the given order.
pub fn format_profile(
    registry: &TransformRegistry,
    profile: &InputProfile,
    format: SequenceFormat,
    attributes: &[(String, String)],
) -> Result<String> {
    let mut parts = Vec::with_capacity(profile.sequence.len());
    for step in profile.sequence.steps() {
        let name = &registry.get(step.id)?.name;
        parts.push(match format {
            SequenceFormat::Bare => name.clone(),
            _ => format!("{name}(ID:{})(TR:{})", step.id, step.tr),
        });
    }
    let mut out = parts.join(" -> ");
    if matches!(format, SequenceFormat::All | SequenceFormat::IdTrGr) {
        out.push_str(&format!(" | (GR:{})", profile.global_rounds));
    }
    if matches!(format, SequenceFormat::All) {
        for (key, value) in attributes {
            out.push_str(&format!(" ({key}:{value})"));
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a canonical sequence string.
pub fn parse_sequence(
    registry: &TransformRegistry,
    input: &str,
    options: ParseOptions,
) -> Result<ParsedProfile> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TuneError::parse("empty sequence string"));
    }

    let (steps_part, tail_part) = match input.split_once('|') {
        Some((left, right)) => (left.trim(), Some(right.trim())),
        None => (input, None),
    };

    let mut steps = Vec::new();
    for raw in steps_part.split("->") {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TuneError::parse(format!(
                "empty step in sequence: {input:?}"
            )));
        }
        steps.push(parse_step(registry, raw, options)?);
    }

    let mut global_rounds = if options.infer_g_rounds {
        options.inferred_gr
    } else {
        1
    };
    let mut attributes = Vec::new();
    if let Some(tail) = tail_part {
        for (key, value) in parse_annotations(tail)? {
            if key.eq_ignore_ascii_case("GR") {
                global_rounds = value
                    .parse::<u32>()
                    .map_err(|_| TuneError::parse(format!("bad GR value: {value:?}")))?;
            } else if RECOGNIZED_ATTRIBUTES
                .iter()
                .any(|a| a.eq_ignore_ascii_case(&key))
            {
                attributes.push((key, value));
            } else {
                return Err(TuneError::UnknownAttribute(key));
            }
        }
    }

    Ok(ParsedProfile {
        sequence: Sequence::new(steps),
        global_rounds,
        attributes,
    })
}

/// One step: `Name`, `Name(ID:n)`, `Name(TR:t)`, `Name(ID:n)(TR:t)`, or a
/// bare numeric id with optional annotations.
fn parse_step(
    registry: &TransformRegistry,
    raw: &str,
    options: ParseOptions,
) -> Result<SequenceStep> {
    let (head, annotations) = match raw.find('(') {
        Some(pos) => (raw[..pos].trim(), parse_annotations(&raw[pos..])?),
        None => (raw, Vec::new()),
    };

    let mut id_annotation = None;
    let mut tr_annotation = None;
    for (key, value) in annotations {
        if key.eq_ignore_ascii_case("ID") {
            let id: u8 = value
                .parse()
                .map_err(|_| TuneError::parse(format!("bad ID value: {value:?}")))?;
            id_annotation = Some(id);
        } else if key.eq_ignore_ascii_case("TR") {
            let tr: u8 = value
                .parse()
                .map_err(|_| TuneError::parse(format!("bad TR value: {value:?}")))?;
            tr_annotation = Some(tr);
        } else {
            return Err(TuneError::parse(format!(
                "unexpected step annotation {key:?} in {raw:?}"
            )));
        }
    }

    let id = resolve_step_id(registry, head, id_annotation)?;
    let tr = tr_annotation.unwrap_or(if options.infer_t_rounds {
        options.inferred_tr
    } else {
        1
    });
    if tr == 0 {
        return Err(TuneError::parse(format!("TR must be >= 1 in {raw:?}")));
    }
    Ok(SequenceStep::new(id, tr))
}

fn resolve_step_id(
    registry: &TransformRegistry,
    head: &str,
    id_annotation: Option<u8>,
) -> Result<u8> {
    if head.is_empty() {
        // Annotation-only step: the (ID:…) must be present.
        return id_annotation
            .ok_or_else(|| TuneError::parse("step has neither name nor (ID:…)"));
    }
    if head.chars().all(|c| c.is_ascii_digit()) {
        let id: u8 = head
            .parse()
            .map_err(|_| TuneError::parse(format!("bad transform id: {head:?}")))?;
        registry.get(id)?;
        return Ok(id);
    }
    // Named step. An explicit id wins but must agree with the name when the
    // name is known; an unknown name with an explicit id is an error.
    let resolved = registry.resolve_name(head);
    match (resolved, id_annotation) {
        (Ok(t), None) => Ok(t.id),
        (Ok(t), Some(id)) => {
            if t.id == id {
                Ok(id)
            } else {
                Err(TuneError::parse(format!(
                    "name {head:?} resolves to id {} but (ID:{id}) was given",
                    t.id
                )))
            }
        }
        (Err(TuneError::AmbiguousTransformName(_)), Some(id)) => {
            // The explicit id disambiguates.
            registry.get(id)?;
            Ok(id)
        }
        (Err(e), _) => Err(e),
    }
}

/// Fold a parsed attribute tail into a run configuration.
///
/// Keys are the recognized setting names of [`RECOGNIZED_ATTRIBUTES`];
/// values use the same tokens the settings print with (`Mode:P`,
/// `InputType:N`, numeric for the rest). Unknown keys were already
/// rejected by [`parse_sequence`]; this reports bad values.
pub fn apply_attributes(
    config: &mut seqtune_types::Config,
    attributes: &[(String, String)],
) -> Result<()> {
    use seqtune_types::{DataType, ScoringMode};

    fn numeric<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
        value
            .parse()
            .map_err(|_| TuneError::parse(format!("bad value for {key}: {value:?}")))
    }

    for (key, value) in attributes {
        if key.eq_ignore_ascii_case("Mode") {
            config.mode = Some(match value.as_str() {
                "P" | "Practical" => ScoringMode::Practical,
                "E" | "Exploratory" => ScoringMode::Exploratory,
                other => {
                    return Err(TuneError::parse(format!("bad value for Mode: {other:?}")));
                }
            });
        } else if key.eq_ignore_ascii_case("InputType") {
            config.input_type = value.parse::<DataType>().map_err(TuneError::parse)?;
        } else if key.eq_ignore_ascii_case("MaxSequenceLen") {
            config.max_sequence_len = numeric(key, value)?;
        } else if key.eq_ignore_ascii_case("MaxTR") {
            config.max_tr = numeric(key, value)?;
        } else if key.eq_ignore_ascii_case("MaxGR") {
            config.max_gr = numeric(key, value)?;
        } else if key.eq_ignore_ascii_case("RequiredPassCount") {
            config.required_pass_count = numeric(key, value)?;
        } else if key.eq_ignore_ascii_case("ExitCount") {
            config.exit_count = numeric(key, value)?;
        } else {
            return Err(TuneError::UnknownAttribute(key.clone()));
        }
    }
    Ok(())
}

/// Parse a run of `(Key:value)` groups, tolerating spaces between groups.
fn parse_annotations(raw: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    let mut rest = raw.trim();
    while !rest.is_empty() {
        if !rest.starts_with('(') {
            return Err(TuneError::parse(format!(
                "expected '(' in annotations: {raw:?}"
            )));
        }
        let close = rest
            .find(')')
            .ok_or_else(|| TuneError::parse(format!("unclosed annotation in {raw:?}")))?;
        let body = &rest[1..close];
        let (key, value) = body
            .split_once(':')
            .ok_or_else(|| TuneError::parse(format!("annotation missing ':': {body:?}")))?;
        out.push((key.trim().to_owned(), value.trim().to_owned()));
        rest = rest[close + 1..].trim_start();
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use seqtune_cipher::registry::ids;

    use super::*;

    fn registry() -> TransformRegistry {
        TransformRegistry::reference()
    }

    fn parse(s: &str) -> ParsedProfile {
        parse_sequence(&registry(), s, ParseOptions::default()).unwrap()
    }

    #[test]
    fn canonical_string_round_trips() {
        let reg = registry();
        let profile = InputProfile::new(
            "p",
            Sequence::from_ids_and_rounds(&[ids::MASK_ADD, ids::RIFFLE], &[3, 1]),
            5,
        );
        let s = format_profile(&reg, &profile, SequenceFormat::All, &[]).unwrap();
        assert_eq!(s, "MaskAdd(ID:10)(TR:3) -> Riffle(ID:18)(TR:1) | (GR:5)");

        let parsed = parse(&s);
        assert_eq!(parsed.sequence, profile.sequence);
        assert_eq!(parsed.sequence.steps()[0].tr, 3);
        assert_eq!(parsed.global_rounds, 5);

        let again = format_profile(
            &reg,
            &parsed.clone().into_profile("p"),
            SequenceFormat::All,
            &[],
        )
        .unwrap();
        assert_eq!(again, s);
    }

    #[test]
    fn all_formats_reparse_to_the_same_identity() {
        let reg = registry();
        let profile = InputProfile::new(
            "p",
            Sequence::from_ids_and_rounds(&[ids::XOR_MASK, ids::SUB_BYTES], &[2, 4]),
            3,
        );
        for fmt in [
            SequenceFormat::All,
            SequenceFormat::Bare,
            SequenceFormat::IdTr,
            SequenceFormat::IdTrGr,
        ] {
            let s = format_profile(&reg, &profile, fmt, &[]).unwrap();
            let parsed = parse_sequence(&reg, &s, ParseOptions::default()).unwrap();
            assert_eq!(parsed.sequence, profile.sequence, "format {fmt:?}");
        }
    }

    #[test]
    fn missing_rounds_default_to_one() {
        let parsed = parse("MaskAdd -> Riffle");
        assert_eq!(parsed.global_rounds, 1);
        assert!(parsed.sequence.steps().iter().all(|s| s.tr == 1));
    }

    #[test]
    fn inference_flags_inject_caller_defaults() {
        let options = ParseOptions {
            infer_t_rounds: true,
            infer_g_rounds: true,
            inferred_tr: 4,
            inferred_gr: 7,
        };
        let parsed = parse_sequence(&registry(), "MaskAdd -> Riffle(TR:2)", options).unwrap();
        assert_eq!(parsed.sequence.steps()[0].tr, 4);
        assert_eq!(parsed.sequence.steps()[1].tr, 2);
        assert_eq!(parsed.global_rounds, 7);
    }

    #[test]
    fn bare_ids_resolve_through_the_registry() {
        let parsed = parse("10 -> 18");
        assert_eq!(parsed.sequence.ids(), vec![ids::MASK_ADD, ids::RIFFLE]);
        assert!(parse_sequence(&registry(), "99", ParseOptions::default()).is_err());
    }

    #[test]
    fn name_id_conflicts_are_rejected() {
        let err = parse_sequence(&registry(), "MaskAdd(ID:18)", ParseOptions::default());
        assert!(err.is_err());
    }

    #[test]
    fn unknown_attribute_keys_fail() {
        let err = parse_sequence(
            &registry(),
            "MaskAdd | (GR:3) (Bogus:1)",
            ParseOptions::default(),
        );
        assert!(matches!(err, Err(TuneError::UnknownAttribute(k)) if k == "Bogus"));
    }

    #[test]
    fn attribute_tail_settings_fold_into_the_config() {
        use seqtune_types::{Config, DataType, ScoringMode};

        let parsed = parse(
            "MaskAdd | (GR:2) (Mode:E) (InputType:R) (MaxGR:7) (ExitCount:4)",
        );
        let mut config = Config::default();
        apply_attributes(&mut config, &parsed.attributes).unwrap();
        assert_eq!(config.mode, Some(ScoringMode::Exploratory));
        assert_eq!(config.input_type, DataType::Random);
        assert_eq!(config.max_gr, 7);
        assert_eq!(config.exit_count, 4);

        let bad = vec![("MaxGR".to_owned(), "lots".to_owned())];
        assert!(apply_attributes(&mut config, &bad).is_err());
    }

    #[test]
    fn recognized_attributes_are_preserved_in_order() {
        let parsed = parse("MaskAdd | (GR:2) (Mode:P) (InputType:N)");
        assert_eq!(
            parsed.attributes,
            vec![
                ("Mode".to_owned(), "P".to_owned()),
                ("InputType".to_owned(), "N".to_owned())
            ]
        );
    }
}
