//! Command parsing from argument frames.
//!
//! Converts a [`Frame`] (expected to be an array) into a typed
//! [`Command`] enum. Arity, option keywords, and integer and float
//! arguments are checked here. Score and lex range tokens stay raw: their
//! grammar belongs to the engine, which parses them before touching any
//! state.
//!
//! The legacy range commands (ZREVRANGE, ZRANGEBYSCORE and friends) parse
//! into the same [`Command::ZRange`] as the unified ZRANGE form, so both
//! spellings of a query execute identically.

use bytes::Bytes;

use crate::error::ProtocolError;
use crate::types::Frame;

/// A parsed client command, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// GET <key>. Returns the value or nil.
    Get { key: String },

    /// SET <key> <value>.
    Set { key: String, value: Bytes },

    /// DEL <key> [key ...]. Returns the number of keys removed.
    Del { keys: Vec<String> },

    /// EXISTS <key> [key ...]. Returns the number of keys that exist.
    Exists { keys: Vec<String> },

    /// TYPE <key>. Returns the type of the value stored at key.
    Type { key: String },

    /// ZADD <key> [NX|XX] [GT|LT] [CH] [INCR] <score> <member> [score member ...].
    ///
    /// Flag combinations are validated by the engine so that ZADD with and
    /// without INCR report conflicts the same way.
    ZAdd {
        key: String,
        flags: ZAddFlags,
        incr: bool,
        members: Vec<(f64, Bytes)>,
    },

    /// ZINCRBY <key> <increment> <member>.
    ZIncrBy {
        key: String,
        delta: f64,
        member: Bytes,
    },

    /// ZREM <key> <member> [member ...].
    ZRem { key: String, members: Vec<Bytes> },

    /// ZCARD <key>.
    ZCard { key: String },

    /// ZSCORE <key> <member>.
    ZScore { key: String, member: Bytes },

    /// ZMSCORE <key> <member> [member ...].
    ZMScore { key: String, members: Vec<Bytes> },

    /// ZRANK / ZREVRANK <key> <member>.
    ZRank {
        key: String,
        member: Bytes,
        rev: bool,
    },

    /// Every range read: unified ZRANGE and the legacy spellings.
    ZRange {
        key: String,
        range: RangeSpec,
        rev: bool,
        limit: Option<RangeLimit>,
        with_scores: bool,
    },

    /// ZCOUNT <key> <min> <max>.
    ZCount { key: String, min: Bytes, max: Bytes },

    /// ZLEXCOUNT <key> <min> <max>.
    ZLexCount { key: String, min: Bytes, max: Bytes },

    /// ZREMRANGEBYRANK <key> <start> <stop>.
    ZRemRangeByRank { key: String, start: i64, stop: i64 },

    /// ZREMRANGEBYSCORE <key> <min> <max>.
    ZRemRangeByScore { key: String, min: Bytes, max: Bytes },

    /// ZREMRANGEBYLEX <key> <min> <max>.
    ZRemRangeByLex { key: String, min: Bytes, max: Bytes },

    /// ZUNIONSTORE <dest> <numkeys> <key> [key ...] [WEIGHTS w ...] [AGGREGATE SUM|MIN|MAX].
    ZUnionStore(StoreArgs),

    /// ZINTERSTORE, same shape as ZUNIONSTORE.
    ZInterStore(StoreArgs),

    /// ZPOPMIN / ZPOPMAX <key> [count].
    ZPop {
        key: String,
        count: Option<usize>,
        max: bool,
    },

    /// ZSCAN <key> <cursor> [MATCH pattern] [COUNT count].
    ZScan {
        key: String,
        cursor: usize,
        pattern: Option<Bytes>,
        count: Option<usize>,
    },

    /// CONFIG GET <pattern>.
    ConfigGet { pattern: String },

    /// CONFIG SET <param> <value>.
    ConfigSet { param: String, value: String },

    /// A command we don't recognize.
    Unknown(String),
}

/// Flags for the ZADD command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZAddFlags {
    /// Only add new members, don't update existing scores.
    pub nx: bool,
    /// Only update existing members, don't add new ones.
    pub xx: bool,
    /// Only update when new score > current score.
    pub gt: bool,
    /// Only update when new score < current score.
    pub lt: bool,
    /// Return count of changed members (added + updated) instead of just added.
    pub ch: bool,
}

/// What a range read selects on. Bounds are always stored low end first,
/// whatever order the command spelled them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    Rank { start: i64, stop: i64 },
    Score { min: Bytes, max: Bytes },
    Lex { min: Bytes, max: Bytes },
}

/// LIMIT <offset> <count>.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLimit {
    pub offset: i64,
    pub count: i64,
}

/// How a store command combines scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreAggregate {
    #[default]
    Sum,
    Min,
    Max,
}

/// Arguments shared by ZUNIONSTORE and ZINTERSTORE.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreArgs {
    pub dest: String,
    pub keys: Vec<String>,
    /// One weight per key; 1.0 when WEIGHTS is absent.
    pub weights: Vec<f64>,
    pub aggregate: StoreAggregate,
}

impl Command {
    /// Parses a [`Frame`] into a [`Command`].
    ///
    /// Expects an array frame where the first element is the command name
    /// (as a bulk or simple string) and the rest are arguments.
    pub fn from_frame(frame: Frame) -> Result<Command, ProtocolError> {
        let frames = match frame {
            Frame::Array(frames) => frames,
            _ => {
                return Err(ProtocolError::InvalidCommandFrame(
                    "expected array frame".into(),
                ));
            }
        };

        let Some((name, args)) = frames.split_first() else {
            return Err(ProtocolError::InvalidCommandFrame(
                "empty command array".into(),
            ));
        };

        let name = extract_string(name)?;
        let name_upper = name.to_ascii_uppercase();

        match name_upper.as_str() {
            "GET" => parse_get(args),
            "SET" => parse_set(args),
            "DEL" => parse_del(args),
            "EXISTS" => parse_exists(args),
            "TYPE" => parse_type(args),
            "ZADD" => parse_zadd(args),
            "ZINCRBY" => parse_zincrby(args),
            "ZREM" => parse_zrem(args),
            "ZCARD" => parse_zcard(args),
            "ZSCORE" => parse_zscore(args),
            "ZMSCORE" => parse_zmscore(args),
            "ZRANK" => parse_zrank(args, false),
            "ZREVRANK" => parse_zrank(args, true),
            "ZRANGE" => parse_zrange(args),
            "ZREVRANGE" => parse_zrevrange(args),
            "ZRANGEBYSCORE" => parse_legacy_range(args, RangeBy::Score, false),
            "ZREVRANGEBYSCORE" => parse_legacy_range(args, RangeBy::Score, true),
            "ZRANGEBYLEX" => parse_legacy_range(args, RangeBy::Lex, false),
            "ZREVRANGEBYLEX" => parse_legacy_range(args, RangeBy::Lex, true),
            "ZCOUNT" => parse_bounds(args, "zcount").map(|(key, min, max)| Command::ZCount {
                key,
                min,
                max,
            }),
            "ZLEXCOUNT" => parse_bounds(args, "zlexcount").map(|(key, min, max)| {
                Command::ZLexCount { key, min, max }
            }),
            "ZREMRANGEBYRANK" => parse_zremrangebyrank(args),
            "ZREMRANGEBYSCORE" => parse_bounds(args, "zremrangebyscore").map(|(key, min, max)| {
                Command::ZRemRangeByScore { key, min, max }
            }),
            "ZREMRANGEBYLEX" => parse_bounds(args, "zremrangebylex").map(|(key, min, max)| {
                Command::ZRemRangeByLex { key, min, max }
            }),
            "ZUNIONSTORE" => parse_store(args, "zunionstore").map(Command::ZUnionStore),
            "ZINTERSTORE" => parse_store(args, "zinterstore").map(Command::ZInterStore),
            "ZPOPMIN" => parse_zpop(args, false),
            "ZPOPMAX" => parse_zpop(args, true),
            "ZSCAN" => parse_zscan(args),
            "CONFIG" => parse_config(args),
            _ => Ok(Command::Unknown(name)),
        }
    }
}

impl Command {
    /// Lowercase command name, for logging.
    pub fn command_name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "get",
            Command::Set { .. } => "set",
            Command::Del { .. } => "del",
            Command::Exists { .. } => "exists",
            Command::Type { .. } => "type",
            Command::ZAdd { .. } => "zadd",
            Command::ZIncrBy { .. } => "zincrby",
            Command::ZRem { .. } => "zrem",
            Command::ZCard { .. } => "zcard",
            Command::ZScore { .. } => "zscore",
            Command::ZMScore { .. } => "zmscore",
            Command::ZRank { rev: false, .. } => "zrank",
            Command::ZRank { rev: true, .. } => "zrevrank",
            Command::ZRange { .. } => "zrange",
            Command::ZCount { .. } => "zcount",
            Command::ZLexCount { .. } => "zlexcount",
            Command::ZRemRangeByRank { .. } => "zremrangebyrank",
            Command::ZRemRangeByScore { .. } => "zremrangebyscore",
            Command::ZRemRangeByLex { .. } => "zremrangebylex",
            Command::ZUnionStore(_) => "zunionstore",
            Command::ZInterStore(_) => "zinterstore",
            Command::ZPop { max: false, .. } => "zpopmin",
            Command::ZPop { max: true, .. } => "zpopmax",
            Command::ZScan { .. } => "zscan",
            Command::ConfigGet { .. } | Command::ConfigSet { .. } => "config",
            Command::Unknown(_) => "unknown",
        }
    }
}

/// Extracts a UTF-8 string from a Bulk or Simple frame.
fn extract_string(frame: &Frame) -> Result<String, ProtocolError> {
    match frame {
        Frame::Bulk(data) => String::from_utf8(data.to_vec()).map_err(|_| {
            ProtocolError::InvalidCommandFrame("argument is not valid utf-8".into())
        }),
        Frame::Simple(s) => Ok(s.clone()),
        _ => Err(ProtocolError::InvalidCommandFrame(
            "expected bulk or simple string".into(),
        )),
    }
}

/// Extracts raw bytes from a Bulk or Simple frame.
fn extract_bytes(frame: &Frame) -> Result<Bytes, ProtocolError> {
    match frame {
        Frame::Bulk(data) => Ok(data.clone()),
        Frame::Simple(s) => Ok(Bytes::from(s.clone().into_bytes())),
        _ => Err(ProtocolError::InvalidCommandFrame(
            "expected bulk or simple string argument".into(),
        )),
    }
}

fn extract_keys(frames: &[Frame]) -> Result<Vec<String>, ProtocolError> {
    frames.iter().map(extract_string).collect()
}

fn extract_members(frames: &[Frame]) -> Result<Vec<Bytes>, ProtocolError> {
    frames.iter().map(extract_bytes).collect()
}

/// Case-insensitive keyword check against an argument.
fn is_keyword(frame: &Frame, keyword: &str) -> bool {
    match frame {
        Frame::Bulk(data) => data.eq_ignore_ascii_case(keyword.as_bytes()),
        Frame::Simple(s) => s.eq_ignore_ascii_case(keyword),
        _ => false,
    }
}

fn parse_i64(frame: &Frame) -> Result<i64, ProtocolError> {
    let s = extract_string(frame).map_err(|_| ProtocolError::NotAnInteger)?;
    s.parse::<i64>().map_err(|_| ProtocolError::NotAnInteger)
}

fn parse_usize(frame: &Frame) -> Result<usize, ProtocolError> {
    let s = extract_string(frame).map_err(|_| ProtocolError::NotAnInteger)?;
    s.parse::<usize>().map_err(|_| ProtocolError::NotAnInteger)
}

/// Parses a float argument. Accepts `inf`, `+inf` and `-inf`; rejects NaN.
fn parse_f64(frame: &Frame) -> Result<f64, ProtocolError> {
    let v = parse_weight(frame)?;
    if v.is_nan() {
        return Err(ProtocolError::NotAFloat);
    }
    Ok(v)
}

/// Like [`parse_f64`] but lets NaN through; the engine rejects NaN
/// weights with its own error.
fn parse_weight(frame: &Frame) -> Result<f64, ProtocolError> {
    let s = extract_string(frame).map_err(|_| ProtocolError::NotAFloat)?;
    s.parse::<f64>().map_err(|_| ProtocolError::NotAFloat)
}

fn parse_get(args: &[Frame]) -> Result<Command, ProtocolError> {
    let [key] = args else {
        return Err(ProtocolError::WrongArity("get".into()));
    };
    Ok(Command::Get {
        key: extract_string(key)?,
    })
}

fn parse_set(args: &[Frame]) -> Result<Command, ProtocolError> {
    match args {
        [key, value] => Ok(Command::Set {
            key: extract_string(key)?,
            value: extract_bytes(value)?,
        }),
        // no expiry or conditional options
        [_, _, ..] => Err(ProtocolError::Syntax),
        _ => Err(ProtocolError::WrongArity("set".into())),
    }
}

fn parse_del(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.is_empty() {
        return Err(ProtocolError::WrongArity("del".into()));
    }
    Ok(Command::Del {
        keys: extract_keys(args)?,
    })
}

fn parse_exists(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.is_empty() {
        return Err(ProtocolError::WrongArity("exists".into()));
    }
    Ok(Command::Exists {
        keys: extract_keys(args)?,
    })
}

fn parse_type(args: &[Frame]) -> Result<Command, ProtocolError> {
    let [key] = args else {
        return Err(ProtocolError::WrongArity("type".into()));
    };
    Ok(Command::Type {
        key: extract_string(key)?,
    })
}

fn parse_zadd(args: &[Frame]) -> Result<Command, ProtocolError> {
    // ZADD key [NX|XX] [GT|LT] [CH] [INCR] score member [score member ...]
    if args.len() < 3 {
        return Err(ProtocolError::WrongArity("zadd".into()));
    }

    let key = extract_string(&args[0])?;
    let mut flags = ZAddFlags::default();
    let mut incr = false;
    let mut idx = 1;

    // parse optional flags before score/member pairs
    while let Some(arg) = args.get(idx) {
        if is_keyword(arg, "NX") {
            flags.nx = true;
        } else if is_keyword(arg, "XX") {
            flags.xx = true;
        } else if is_keyword(arg, "GT") {
            flags.gt = true;
        } else if is_keyword(arg, "LT") {
            flags.lt = true;
        } else if is_keyword(arg, "CH") {
            flags.ch = true;
        } else if is_keyword(arg, "INCR") {
            incr = true;
        } else {
            break;
        }
        idx += 1;
    }

    // remaining args must be score/member pairs
    let remaining = &args[idx..];
    if remaining.is_empty() || remaining.len() % 2 != 0 {
        return Err(ProtocolError::Syntax);
    }

    let mut members = Vec::with_capacity(remaining.len() / 2);
    for pair in remaining.chunks_exact(2) {
        let score = parse_f64(&pair[0])?;
        let member = extract_bytes(&pair[1])?;
        members.push((score, member));
    }

    Ok(Command::ZAdd {
        key,
        flags,
        incr,
        members,
    })
}

fn parse_zincrby(args: &[Frame]) -> Result<Command, ProtocolError> {
    let [key, delta, member] = args else {
        return Err(ProtocolError::WrongArity("zincrby".into()));
    };
    Ok(Command::ZIncrBy {
        key: extract_string(key)?,
        delta: parse_f64(delta)?,
        member: extract_bytes(member)?,
    })
}

fn parse_zrem(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.len() < 2 {
        return Err(ProtocolError::WrongArity("zrem".into()));
    }
    Ok(Command::ZRem {
        key: extract_string(&args[0])?,
        members: extract_members(&args[1..])?,
    })
}

fn parse_zcard(args: &[Frame]) -> Result<Command, ProtocolError> {
    let [key] = args else {
        return Err(ProtocolError::WrongArity("zcard".into()));
    };
    Ok(Command::ZCard {
        key: extract_string(key)?,
    })
}

fn parse_zscore(args: &[Frame]) -> Result<Command, ProtocolError> {
    let [key, member] = args else {
        return Err(ProtocolError::WrongArity("zscore".into()));
    };
    Ok(Command::ZScore {
        key: extract_string(key)?,
        member: extract_bytes(member)?,
    })
}

fn parse_zmscore(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.len() < 2 {
        return Err(ProtocolError::WrongArity("zmscore".into()));
    }
    Ok(Command::ZMScore {
        key: extract_string(&args[0])?,
        members: extract_members(&args[1..])?,
    })
}

fn parse_zrank(args: &[Frame], rev: bool) -> Result<Command, ProtocolError> {
    let [key, member] = args else {
        let name = if rev { "zrevrank" } else { "zrank" };
        return Err(ProtocolError::WrongArity(name.into()));
    };
    Ok(Command::ZRank {
        key: extract_string(key)?,
        member: extract_bytes(member)?,
        rev,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeBy {
    Rank,
    Score,
    Lex,
}

/// Builds the range from two bound tokens in command order. Reversed
/// score and lex queries spell the high bound first.
fn range_spec(by: RangeBy, first: &Frame, second: &Frame, rev: bool) -> Result<RangeSpec, ProtocolError> {
    let (lo, hi) = if rev { (second, first) } else { (first, second) };
    Ok(match by {
        RangeBy::Rank => RangeSpec::Rank {
            start: parse_i64(first)?,
            stop: parse_i64(second)?,
        },
        RangeBy::Score => RangeSpec::Score {
            min: extract_bytes(lo)?,
            max: extract_bytes(hi)?,
        },
        RangeBy::Lex => RangeSpec::Lex {
            min: extract_bytes(lo)?,
            max: extract_bytes(hi)?,
        },
    })
}

fn parse_limit(args: &[Frame]) -> Result<RangeLimit, ProtocolError> {
    let [offset, count] = args else {
        return Err(ProtocolError::Syntax);
    };
    Ok(RangeLimit {
        offset: parse_i64(offset)?,
        count: parse_i64(count)?,
    })
}

fn parse_zrange(args: &[Frame]) -> Result<Command, ProtocolError> {
    // ZRANGE key start stop [BYSCORE|BYLEX] [REV] [LIMIT offset count] [WITHSCORES]
    if args.len() < 3 {
        return Err(ProtocolError::WrongArity("zrange".into()));
    }

    let key = extract_string(&args[0])?;
    let mut by = RangeBy::Rank;
    let mut rev = false;
    let mut limit = None;
    let mut with_scores = false;

    let mut idx = 3;
    while let Some(arg) = args.get(idx) {
        if is_keyword(arg, "BYSCORE") && by != RangeBy::Lex {
            by = RangeBy::Score;
        } else if is_keyword(arg, "BYLEX") && by != RangeBy::Score {
            by = RangeBy::Lex;
        } else if is_keyword(arg, "REV") {
            rev = true;
        } else if is_keyword(arg, "WITHSCORES") {
            with_scores = true;
        } else if is_keyword(arg, "LIMIT") {
            let window = args.get(idx + 1..idx + 3).ok_or(ProtocolError::Syntax)?;
            limit = Some(parse_limit(window)?);
            idx += 2;
        } else {
            return Err(ProtocolError::Syntax);
        }
        idx += 1;
    }

    let range = range_spec(by, &args[1], &args[2], rev)?;
    Ok(Command::ZRange {
        key,
        range,
        rev,
        limit,
        with_scores,
    })
}

fn parse_zrevrange(args: &[Frame]) -> Result<Command, ProtocolError> {
    // ZREVRANGE key start stop [WITHSCORES]
    let (key, start, stop, with_scores) = match args {
        [key, start, stop] => (key, start, stop, false),
        [key, start, stop, opt] if is_keyword(opt, "WITHSCORES") => (key, start, stop, true),
        [_, _, _, _] => return Err(ProtocolError::Syntax),
        _ => return Err(ProtocolError::WrongArity("zrevrange".into())),
    };
    Ok(Command::ZRange {
        key: extract_string(key)?,
        range: range_spec(RangeBy::Rank, start, stop, false)?,
        rev: true,
        limit: None,
        with_scores,
    })
}

/// ZRANGEBYSCORE, ZREVRANGEBYSCORE, ZRANGEBYLEX and ZREVRANGEBYLEX.
fn parse_legacy_range(args: &[Frame], by: RangeBy, rev: bool) -> Result<Command, ProtocolError> {
    if args.len() < 3 {
        let name = match (by, rev) {
            (RangeBy::Lex, false) => "zrangebylex",
            (RangeBy::Lex, true) => "zrevrangebylex",
            (_, false) => "zrangebyscore",
            (_, true) => "zrevrangebyscore",
        };
        return Err(ProtocolError::WrongArity(name.into()));
    }

    let key = extract_string(&args[0])?;
    let mut limit = None;
    let mut with_scores = false;

    let mut idx = 3;
    while let Some(arg) = args.get(idx) {
        // the lex variants never take WITHSCORES
        if is_keyword(arg, "WITHSCORES") && by == RangeBy::Score {
            with_scores = true;
        } else if is_keyword(arg, "LIMIT") {
            let window = args.get(idx + 1..idx + 3).ok_or(ProtocolError::Syntax)?;
            limit = Some(parse_limit(window)?);
            idx += 2;
        } else {
            return Err(ProtocolError::Syntax);
        }
        idx += 1;
    }

    Ok(Command::ZRange {
        key,
        range: range_spec(by, &args[1], &args[2], rev)?,
        rev,
        limit,
        with_scores,
    })
}

/// `<key> <min> <max>` with raw bound tokens.
fn parse_bounds(args: &[Frame], name: &str) -> Result<(String, Bytes, Bytes), ProtocolError> {
    let [key, min, max] = args else {
        return Err(ProtocolError::WrongArity(name.into()));
    };
    Ok((extract_string(key)?, extract_bytes(min)?, extract_bytes(max)?))
}

fn parse_zremrangebyrank(args: &[Frame]) -> Result<Command, ProtocolError> {
    let [key, start, stop] = args else {
        return Err(ProtocolError::WrongArity("zremrangebyrank".into()));
    };
    Ok(Command::ZRemRangeByRank {
        key: extract_string(key)?,
        start: parse_i64(start)?,
        stop: parse_i64(stop)?,
    })
}

fn parse_store(args: &[Frame], name: &str) -> Result<StoreArgs, ProtocolError> {
    // dest numkeys key [key ...] [WEIGHTS weight ...] [AGGREGATE SUM|MIN|MAX]
    if args.len() < 3 {
        return Err(ProtocolError::WrongArity(name.into()));
    }
    let dest = extract_string(&args[0])?;
    let numkeys = parse_i64(&args[1])?;
    if numkeys < 1 {
        return Err(ProtocolError::InvalidCommandFrame(format!(
            "at least 1 input key is needed for '{name}' command"
        )));
    }
    let numkeys = usize::try_from(numkeys).map_err(|_| ProtocolError::Syntax)?;
    let keys_end = numkeys.checked_add(2).ok_or(ProtocolError::Syntax)?;
    let keys = args
        .get(2..keys_end)
        .ok_or(ProtocolError::Syntax)
        .and_then(extract_keys)?;

    let mut weights = vec![1.0; numkeys];
    let mut aggregate = StoreAggregate::default();
    let mut idx = keys_end;
    while let Some(arg) = args.get(idx) {
        if is_keyword(arg, "WEIGHTS") {
            let given = args
                .get(idx + 1..idx + 1 + numkeys)
                .ok_or(ProtocolError::Syntax)?;
            weights = given
                .iter()
                .map(parse_weight)
                .collect::<Result<Vec<_>, _>>()?;
            idx += numkeys;
        } else if is_keyword(arg, "AGGREGATE") {
            let kind = args.get(idx + 1).ok_or(ProtocolError::Syntax)?;
            aggregate = if is_keyword(kind, "SUM") {
                StoreAggregate::Sum
            } else if is_keyword(kind, "MIN") {
                StoreAggregate::Min
            } else if is_keyword(kind, "MAX") {
                StoreAggregate::Max
            } else {
                return Err(ProtocolError::Syntax);
            };
            idx += 1;
        } else {
            return Err(ProtocolError::Syntax);
        }
        idx += 1;
    }

    Ok(StoreArgs {
        dest,
        keys,
        weights,
        aggregate,
    })
}

fn parse_zpop(args: &[Frame], max: bool) -> Result<Command, ProtocolError> {
    let (key, count) = match args {
        [key] => (key, None),
        [key, count] => (key, Some(parse_usize(count)?)),
        _ => {
            let name = if max { "zpopmax" } else { "zpopmin" };
            return Err(ProtocolError::WrongArity(name.into()));
        }
    };
    Ok(Command::ZPop {
        key: extract_string(key)?,
        count,
        max,
    })
}

fn parse_zscan(args: &[Frame]) -> Result<Command, ProtocolError> {
    if args.len() < 2 {
        return Err(ProtocolError::WrongArity("zscan".into()));
    }

    let key = extract_string(&args[0])?;
    let cursor = parse_usize(&args[1])
        .map_err(|_| ProtocolError::InvalidCommandFrame("invalid cursor".into()))?;
    let mut pattern = None;
    let mut count = None;

    let mut idx = 2;
    while let Some(arg) = args.get(idx) {
        let value = args.get(idx + 1).ok_or(ProtocolError::Syntax)?;
        if is_keyword(arg, "MATCH") {
            pattern = Some(extract_bytes(value)?);
        } else if is_keyword(arg, "COUNT") {
            match parse_usize(value)? {
                0 => return Err(ProtocolError::Syntax),
                n => count = Some(n),
            }
        } else {
            return Err(ProtocolError::Syntax);
        }
        idx += 2;
    }

    Ok(Command::ZScan {
        key,
        cursor,
        pattern,
        count,
    })
}

fn parse_config(args: &[Frame]) -> Result<Command, ProtocolError> {
    match args {
        [sub, pattern] if is_keyword(sub, "GET") => Ok(Command::ConfigGet {
            pattern: extract_string(pattern)?,
        }),
        [sub, param, value] if is_keyword(sub, "SET") => Ok(Command::ConfigSet {
            param: extract_string(param)?,
            value: extract_string(value)?,
        }),
        [sub, ..] if is_keyword(sub, "GET") || is_keyword(sub, "SET") => {
            Err(ProtocolError::WrongArity("config".into()))
        }
        [sub, ..] => Err(ProtocolError::InvalidCommandFrame(format!(
            "unknown CONFIG subcommand '{}'",
            extract_string(sub)?
        ))),
        [] => Err(ProtocolError::WrongArity("config".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build an array frame from bulk strings.
    fn cmd(parts: &[&str]) -> Frame {
        Frame::Array(
            parts
                .iter()
                .map(|s| Frame::Bulk(Bytes::from(s.to_string())))
                .collect(),
        )
    }

    fn parse(parts: &[&str]) -> Command {
        Command::from_frame(cmd(parts)).unwrap()
    }

    fn parse_err(parts: &[&str]) -> ProtocolError {
        Command::from_frame(cmd(parts)).unwrap_err()
    }

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    // --- frame shape ---

    #[test]
    fn non_array_frame() {
        let err = Command::from_frame(Frame::Simple("ZADD".into())).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidCommandFrame(_)));
    }

    #[test]
    fn empty_array() {
        let err = Command::from_frame(Frame::Array(vec![])).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidCommandFrame(_)));
    }

    #[test]
    fn unknown_command_keeps_name() {
        assert_eq!(parse(&["FLUSHALL"]), Command::Unknown("FLUSHALL".into()));
    }

    #[test]
    fn command_names() {
        assert_eq!(parse(&["zrevrank", "z", "m"]).command_name(), "zrevrank");
        assert_eq!(parse(&["ZRANGEBYLEX", "z", "-", "+"]).command_name(), "zrange");
        assert_eq!(parse(&["ZPOPMAX", "z"]).command_name(), "zpopmax");
    }

    // --- keyspace ---

    #[test]
    fn set_and_get() {
        assert_eq!(
            parse(&["set", "k", "v"]),
            Command::Set {
                key: "k".into(),
                value: b("v"),
            }
        );
        assert_eq!(parse(&["GET", "k"]), Command::Get { key: "k".into() });
        assert_eq!(parse_err(&["SET", "k", "v", "EX", "10"]), ProtocolError::Syntax);
        assert!(matches!(parse_err(&["GET"]), ProtocolError::WrongArity(_)));
    }

    #[test]
    fn del_exists_type() {
        assert_eq!(
            parse(&["DEL", "a", "b"]),
            Command::Del {
                keys: vec!["a".into(), "b".into()],
            }
        );
        assert_eq!(
            parse(&["EXISTS", "a"]),
            Command::Exists {
                keys: vec!["a".into()],
            }
        );
        assert_eq!(parse(&["TYPE", "a"]), Command::Type { key: "a".into() });
        assert!(matches!(parse_err(&["DEL"]), ProtocolError::WrongArity(_)));
    }

    // --- zadd ---

    #[test]
    fn zadd_basic() {
        assert_eq!(
            parse(&["ZADD", "z", "1", "a", "2.5", "b"]),
            Command::ZAdd {
                key: "z".into(),
                flags: ZAddFlags::default(),
                incr: false,
                members: vec![(1.0, b("a")), (2.5, b("b"))],
            }
        );
    }

    #[test]
    fn zadd_all_flags_any_case() {
        match parse(&["zadd", "z", "xx", "Gt", "CH", "incr", "1", "a"]) {
            Command::ZAdd { flags, incr, .. } => {
                assert!(flags.xx && flags.gt && flags.ch);
                assert!(!flags.nx && !flags.lt);
                assert!(incr);
            }
            other => panic!("expected ZAdd, got {other:?}"),
        }
    }

    #[test]
    fn zadd_conflicting_flags_left_to_engine() {
        match parse(&["ZADD", "z", "NX", "XX", "1", "a"]) {
            Command::ZAdd { flags, .. } => assert!(flags.nx && flags.xx),
            other => panic!("expected ZAdd, got {other:?}"),
        }
    }

    #[test]
    fn zadd_infinities() {
        match parse(&["ZADD", "z", "-inf", "lo", "+inf", "hi", "inf", "hi2"]) {
            Command::ZAdd { members, .. } => {
                assert_eq!(members[0].0, f64::NEG_INFINITY);
                assert_eq!(members[1].0, f64::INFINITY);
                assert_eq!(members[2].0, f64::INFINITY);
            }
            other => panic!("expected ZAdd, got {other:?}"),
        }
    }

    #[test]
    fn zadd_errors() {
        assert!(matches!(parse_err(&["ZADD", "z"]), ProtocolError::WrongArity(_)));
        assert_eq!(parse_err(&["ZADD", "z", "1", "a", "2"]), ProtocolError::Syntax);
        assert_eq!(parse_err(&["ZADD", "z", "NX", "CH"]), ProtocolError::Syntax);
        assert_eq!(parse_err(&["ZADD", "z", "abc", "a"]), ProtocolError::NotAFloat);
        assert_eq!(parse_err(&["ZADD", "z", "nan", "a"]), ProtocolError::NotAFloat);
    }

    #[test]
    fn zincrby() {
        assert_eq!(
            parse(&["ZINCRBY", "z", "-1.5", "m"]),
            Command::ZIncrBy {
                key: "z".into(),
                delta: -1.5,
                member: b("m"),
            }
        );
        assert_eq!(parse_err(&["ZINCRBY", "z", "x", "m"]), ProtocolError::NotAFloat);
        assert!(matches!(parse_err(&["ZINCRBY", "z", "1"]), ProtocolError::WrongArity(_)));
    }

    // --- point reads ---

    #[test]
    fn zrem_zcard_zscore_zmscore() {
        assert_eq!(
            parse(&["ZREM", "z", "a", "b"]),
            Command::ZRem {
                key: "z".into(),
                members: vec![b("a"), b("b")],
            }
        );
        assert_eq!(parse(&["ZCARD", "z"]), Command::ZCard { key: "z".into() });
        assert_eq!(
            parse(&["ZSCORE", "z", "a"]),
            Command::ZScore {
                key: "z".into(),
                member: b("a"),
            }
        );
        assert_eq!(
            parse(&["ZMSCORE", "z", "a", "b"]),
            Command::ZMScore {
                key: "z".into(),
                members: vec![b("a"), b("b")],
            }
        );
        assert!(matches!(parse_err(&["ZREM", "z"]), ProtocolError::WrongArity(_)));
        assert!(matches!(parse_err(&["ZMSCORE", "z"]), ProtocolError::WrongArity(_)));
    }

    #[test]
    fn zrank_and_zrevrank() {
        assert_eq!(
            parse(&["ZREVRANK", "z", "a"]),
            Command::ZRank {
                key: "z".into(),
                member: b("a"),
                rev: true,
            }
        );
        assert_eq!(
            parse_err(&["ZRANK", "z"]),
            ProtocolError::WrongArity("zrank".into())
        );
    }

    // --- ranges ---

    #[test]
    fn zrange_rank_default() {
        assert_eq!(
            parse(&["ZRANGE", "z", "0", "-1"]),
            Command::ZRange {
                key: "z".into(),
                range: RangeSpec::Rank { start: 0, stop: -1 },
                rev: false,
                limit: None,
                with_scores: false,
            }
        );
    }

    #[test]
    fn zrange_options_in_any_order() {
        let a = parse(&["ZRANGE", "z", "(5", "1", "LIMIT", "1", "2", "WITHSCORES", "REV", "BYSCORE"]);
        let reordered = parse(&["zrange", "z", "(5", "1", "byscore", "rev", "withscores", "limit", "1", "2"]);
        assert_eq!(a, reordered);
        assert_eq!(
            a,
            Command::ZRange {
                key: "z".into(),
                range: RangeSpec::Score {
                    min: b("1"),
                    max: b("(5"),
                },
                rev: true,
                limit: Some(RangeLimit { offset: 1, count: 2 }),
                with_scores: true,
            }
        );
    }

    #[test]
    fn zrange_rev_rank_keeps_index_order() {
        match parse(&["ZRANGE", "z", "0", "1", "REV"]) {
            Command::ZRange { range, rev, .. } => {
                assert_eq!(range, RangeSpec::Rank { start: 0, stop: 1 });
                assert!(rev);
            }
            other => panic!("expected ZRange, got {other:?}"),
        }
    }

    #[test]
    fn zrange_errors() {
        assert!(matches!(parse_err(&["ZRANGE", "z", "0"]), ProtocolError::WrongArity(_)));
        assert_eq!(parse_err(&["ZRANGE", "z", "0", "1", "BOGUS"]), ProtocolError::Syntax);
        assert_eq!(
            parse_err(&["ZRANGE", "z", "0", "1", "BYSCORE", "BYLEX"]),
            ProtocolError::Syntax
        );
        assert_eq!(parse_err(&["ZRANGE", "z", "0", "1", "LIMIT", "1"]), ProtocolError::Syntax);
        assert_eq!(
            parse_err(&["ZRANGE", "z", "a", "1"]),
            ProtocolError::NotAnInteger
        );
        assert_eq!(
            parse_err(&["ZRANGE", "z", "0", "1", "BYSCORE", "LIMIT", "x", "1"]),
            ProtocolError::NotAnInteger
        );
    }

    fn assert_same(legacy: &[&str], unified: &[&str]) {
        assert_eq!(parse(legacy), parse(unified), "{legacy:?} vs {unified:?}");
    }

    #[test]
    fn legacy_forms_match_unified() {
        assert_same(
            &["ZREVRANGE", "z", "0", "2", "WITHSCORES"],
            &["ZRANGE", "z", "0", "2", "REV", "WITHSCORES"],
        );
        assert_same(
            &["ZRANGEBYSCORE", "z", "-inf", "(3", "LIMIT", "0", "5"],
            &["ZRANGE", "z", "-inf", "(3", "BYSCORE", "LIMIT", "0", "5"],
        );
        assert_same(
            &["ZREVRANGEBYSCORE", "z", "+inf", "1", "WITHSCORES"],
            &["ZRANGE", "z", "+inf", "1", "BYSCORE", "REV", "WITHSCORES"],
        );
        assert_same(
            &["ZRANGEBYLEX", "z", "[a", "(c"],
            &["ZRANGE", "z", "[a", "(c", "BYLEX"],
        );
        assert_same(
            &["ZREVRANGEBYLEX", "z", "+", "-", "LIMIT", "1", "1"],
            &["ZRANGE", "z", "+", "-", "BYLEX", "REV", "LIMIT", "1", "1"],
        );
    }

    #[test]
    fn legacy_rev_score_normalizes_bounds() {
        match parse(&["ZREVRANGEBYSCORE", "z", "10", "(2"]) {
            Command::ZRange { range, .. } => assert_eq!(
                range,
                RangeSpec::Score {
                    min: b("(2"),
                    max: b("10"),
                }
            ),
            other => panic!("expected ZRange, got {other:?}"),
        }
    }

    #[test]
    fn bylex_legacy_rejects_withscores() {
        assert_eq!(
            parse_err(&["ZRANGEBYLEX", "z", "-", "+", "WITHSCORES"]),
            ProtocolError::Syntax
        );
    }

    #[test]
    fn zrevrange_arity() {
        assert!(matches!(parse_err(&["ZREVRANGE", "z", "0"]), ProtocolError::WrongArity(_)));
        assert_eq!(parse_err(&["ZREVRANGE", "z", "0", "1", "LIMIT"]), ProtocolError::Syntax);
    }

    // --- counts and removals ---

    #[test]
    fn count_and_remrange() {
        assert_eq!(
            parse(&["ZCOUNT", "z", "(1", "+inf"]),
            Command::ZCount {
                key: "z".into(),
                min: b("(1"),
                max: b("+inf"),
            }
        );
        assert_eq!(
            parse(&["ZLEXCOUNT", "z", "-", "+"]),
            Command::ZLexCount {
                key: "z".into(),
                min: b("-"),
                max: b("+"),
            }
        );
        assert_eq!(
            parse(&["ZREMRANGEBYRANK", "z", "0", "-2"]),
            Command::ZRemRangeByRank {
                key: "z".into(),
                start: 0,
                stop: -2,
            }
        );
        assert!(matches!(
            parse(&["ZREMRANGEBYSCORE", "z", "1", "2"]),
            Command::ZRemRangeByScore { .. }
        ));
        assert!(matches!(
            parse(&["ZREMRANGEBYLEX", "z", "[a", "[b"]),
            Command::ZRemRangeByLex { .. }
        ));
        assert_eq!(
            parse_err(&["ZCOUNT", "z", "1"]),
            ProtocolError::WrongArity("zcount".into())
        );
    }

    // --- store ---

    #[test]
    fn store_defaults() {
        assert_eq!(
            parse(&["ZUNIONSTORE", "out", "2", "a", "b"]),
            Command::ZUnionStore(StoreArgs {
                dest: "out".into(),
                keys: vec!["a".into(), "b".into()],
                weights: vec![1.0, 1.0],
                aggregate: StoreAggregate::Sum,
            })
        );
    }

    #[test]
    fn store_weights_and_aggregate() {
        assert_eq!(
            parse(&["ZINTERSTORE", "out", "2", "a", "b", "AGGREGATE", "max", "WEIGHTS", "2", "-inf"]),
            Command::ZInterStore(StoreArgs {
                dest: "out".into(),
                keys: vec!["a".into(), "b".into()],
                weights: vec![2.0, f64::NEG_INFINITY],
                aggregate: StoreAggregate::Max,
            })
        );
    }

    #[test]
    fn store_nan_weight_reaches_engine() {
        match parse(&["ZUNIONSTORE", "out", "1", "a", "WEIGHTS", "nan"]) {
            Command::ZUnionStore(args) => assert!(args.weights[0].is_nan()),
            other => panic!("expected ZUnionStore, got {other:?}"),
        }
    }

    #[test]
    fn store_errors() {
        assert!(matches!(
            parse_err(&["ZUNIONSTORE", "out", "0", "a"]),
            ProtocolError::InvalidCommandFrame(_)
        ));
        assert_eq!(parse_err(&["ZUNIONSTORE", "out", "3", "a", "b"]), ProtocolError::Syntax);
        assert_eq!(
            parse_err(&["ZUNIONSTORE", "out", "2", "a", "b", "WEIGHTS", "1"]),
            ProtocolError::Syntax
        );
        assert_eq!(
            parse_err(&["ZUNIONSTORE", "out", "1", "a", "WEIGHTS", "x"]),
            ProtocolError::NotAFloat
        );
        assert_eq!(
            parse_err(&["ZUNIONSTORE", "out", "1", "a", "AGGREGATE", "AVG"]),
            ProtocolError::Syntax
        );
        assert_eq!(parse_err(&["ZINTERSTORE", "out", "x", "a"]), ProtocolError::NotAnInteger);
        assert!(matches!(parse_err(&["ZINTERSTORE", "out", "1"]), ProtocolError::WrongArity(_)));
    }

    // --- pop and config ---

    #[test]
    fn zpop() {
        assert_eq!(
            parse(&["ZPOPMIN", "z"]),
            Command::ZPop {
                key: "z".into(),
                count: None,
                max: false,
            }
        );
        assert_eq!(
            parse(&["ZPOPMAX", "z", "3"]),
            Command::ZPop {
                key: "z".into(),
                count: Some(3),
                max: true,
            }
        );
        assert_eq!(parse_err(&["ZPOPMAX", "z", "-1"]), ProtocolError::NotAnInteger);
    }

    #[test]
    fn zscan_options() {
        assert_eq!(
            parse(&["ZSCAN", "z", "0"]),
            Command::ZScan {
                key: "z".into(),
                cursor: 0,
                pattern: None,
                count: None,
            }
        );
        assert_eq!(
            parse(&["zscan", "z", "12", "count", "5", "MATCH", "user:*"]),
            Command::ZScan {
                key: "z".into(),
                cursor: 12,
                pattern: Some(Bytes::from("user:*")),
                count: Some(5),
            }
        );
        assert_eq!(parse(&["ZSCAN", "z", "0"]).command_name(), "zscan");
    }

    #[test]
    fn zscan_errors() {
        assert_eq!(parse_err(&["ZSCAN", "z"]), ProtocolError::WrongArity("zscan".into()));
        assert_eq!(
            parse_err(&["ZSCAN", "z", "abc"]),
            ProtocolError::InvalidCommandFrame("invalid cursor".into())
        );
        assert_eq!(
            parse_err(&["ZSCAN", "z", "-1"]),
            ProtocolError::InvalidCommandFrame("invalid cursor".into())
        );
        assert_eq!(parse_err(&["ZSCAN", "z", "0", "COUNT"]), ProtocolError::Syntax);
        assert_eq!(parse_err(&["ZSCAN", "z", "0", "COUNT", "0"]), ProtocolError::Syntax);
        assert_eq!(parse_err(&["ZSCAN", "z", "0", "COUNT", "x"]), ProtocolError::NotAnInteger);
        assert_eq!(parse_err(&["ZSCAN", "z", "0", "NOPE", "1"]), ProtocolError::Syntax);
    }

    #[test]
    fn config() {
        assert_eq!(
            parse(&["CONFIG", "get", "zset-*"]),
            Command::ConfigGet {
                pattern: "zset-*".into(),
            }
        );
        assert_eq!(
            parse(&["config", "SET", "zset-max-listpack-entries", "16"]),
            Command::ConfigSet {
                param: "zset-max-listpack-entries".into(),
                value: "16".into(),
            }
        );
        assert!(matches!(parse_err(&["CONFIG", "GET"]), ProtocolError::WrongArity(_)));
        assert!(matches!(
            parse_err(&["CONFIG", "RESETSTAT"]),
            ProtocolError::InvalidCommandFrame(_)
        ));
    }
}
