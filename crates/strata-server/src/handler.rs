//! Command execution against a shared keyspace.
//!
//! Each command runs inside one `SharedKeyspace::execute` call. Range
//! tokens are parsed into engine types before the lock is taken, so a
//! malformed bound never reaches the keyspace.

use bytes::Bytes;
use strata_core::types::range::flatten;
use strata_core::{
    format_score, Aggregate, Entry, GlobPattern, LexRange, Limit, RangeQuery, ScoreRange, SharedKeyspace,
    ZSetError,
};
use strata_protocol::{Command, Frame, RangeLimit, RangeSpec, StoreAggregate, StoreArgs};
use tracing::{trace, warn};

use crate::config::ConfigRegistry;

/// Entries visited per ZSCAN step when the client gives no COUNT.
const DEFAULT_SCAN_COUNT: usize = 10;

/// Parses an argument frame and executes it. Parse failures become error
/// replies.
pub fn execute_frame(keyspace: &SharedKeyspace, registry: &ConfigRegistry, frame: Frame) -> Frame {
    match Command::from_frame(frame) {
        Ok(cmd) => execute(keyspace, registry, cmd),
        Err(e) => Frame::Error(e.to_string()),
    }
}

/// Executes a parsed command and builds its reply.
pub fn execute(keyspace: &SharedKeyspace, registry: &ConfigRegistry, cmd: Command) -> Frame {
    trace!(command = cmd.command_name(), "executing");

    match cmd {
        Command::Get { key } => reply(keyspace.execute(|ks| ks.get(&key)), |value| {
            value.map_or(Frame::Null, Frame::Bulk)
        }),

        Command::Set { key, value } => {
            keyspace.execute(|ks| ks.set(&key, value));
            Frame::ok()
        }

        Command::Del { keys } => {
            let count = keyspace.execute(|ks| keys.iter().filter(|k| ks.del(k)).count());
            Frame::Integer(count as i64)
        }

        Command::Exists { keys } => {
            let count = keyspace.execute(|ks| keys.iter().filter(|k| ks.exists(k)).count());
            Frame::Integer(count as i64)
        }

        Command::Type { key } => {
            Frame::Simple(keyspace.execute(|ks| ks.value_type(&key)).into())
        }

        Command::ZAdd {
            key,
            flags,
            incr,
            members,
        } => {
            let flags = strata_core::ZAddFlags {
                nx: flags.nx,
                xx: flags.xx,
                gt: flags.gt,
                lt: flags.lt,
                ch: flags.ch,
            };
            if incr {
                reply(
                    keyspace.execute(|ks| ks.zadd_incr(&key, &members, &flags)),
                    optional_score,
                )
            } else {
                reply(keyspace.execute(|ks| ks.zadd(&key, &members, &flags)), integer)
            }
        }

        Command::ZIncrBy { key, delta, member } => reply(
            keyspace.execute(|ks| ks.zincrby(&key, delta, member)),
            score_frame,
        ),

        Command::ZRem { key, members } => {
            reply(keyspace.execute(|ks| ks.zrem(&key, &members)), integer)
        }

        Command::ZCard { key } => reply(keyspace.execute(|ks| ks.zcard(&key)), integer),

        Command::ZScore { key, member } => reply(
            keyspace.execute(|ks| ks.zscore(&key, &member)),
            optional_score,
        ),

        Command::ZMScore { key, members } => {
            reply(keyspace.execute(|ks| ks.zmscore(&key, &members)), |scores| {
                Frame::Array(scores.into_iter().map(optional_score).collect())
            })
        }

        Command::ZRank { key, member, rev } => {
            reply(keyspace.execute(|ks| ks.zrank(&key, &member, rev)), |rank| {
                rank.map_or(Frame::Null, |r| Frame::Integer(r as i64))
            })
        }

        Command::ZRange {
            key,
            range,
            rev,
            limit,
            with_scores,
        } => {
            let query = match build_query(range, rev, limit) {
                Ok(query) => query,
                Err(e) => return Frame::Error(e.to_string()),
            };
            let with_scores = with_scores && query.allows_scores();
            reply(keyspace.execute(|ks| ks.zrange(&key, &query)), |entries| {
                entries_frame(entries, with_scores)
            })
        }

        Command::ZCount { key, min, max } => match ScoreRange::parse(&min, &max) {
            Ok(range) => reply(keyspace.execute(|ks| ks.zcount(&key, &range)), integer),
            Err(e) => Frame::Error(e.to_string()),
        },

        Command::ZLexCount { key, min, max } => match LexRange::parse(&min, &max) {
            Ok(range) => reply(keyspace.execute(|ks| ks.zlexcount(&key, &range)), integer),
            Err(e) => Frame::Error(e.to_string()),
        },

        Command::ZRemRangeByRank { key, start, stop } => reply(
            keyspace.execute(|ks| ks.zremrangebyrank(&key, start, stop)),
            integer,
        ),

        Command::ZRemRangeByScore { key, min, max } => match ScoreRange::parse(&min, &max) {
            Ok(range) => reply(
                keyspace.execute(|ks| ks.zremrangebyscore(&key, &range)),
                integer,
            ),
            Err(e) => Frame::Error(e.to_string()),
        },

        Command::ZRemRangeByLex { key, min, max } => match LexRange::parse(&min, &max) {
            Ok(range) => reply(
                keyspace.execute(|ks| ks.zremrangebylex(&key, &range)),
                integer,
            ),
            Err(e) => Frame::Error(e.to_string()),
        },

        Command::ZUnionStore(args) => {
            let (dest, sources, aggregate) = store_inputs(&args);
            reply(
                keyspace.execute(|ks| ks.zunionstore(dest, &sources, aggregate)),
                integer,
            )
        }

        Command::ZInterStore(args) => {
            let (dest, sources, aggregate) = store_inputs(&args);
            reply(
                keyspace.execute(|ks| ks.zinterstore(dest, &sources, aggregate)),
                integer,
            )
        }

        Command::ZPop { key, count, max } => {
            let count = count.unwrap_or(1);
            reply(keyspace.execute(|ks| ks.zpop(&key, count, max)), |entries| {
                entries_frame(entries, true)
            })
        }

        Command::ZScan {
            key,
            cursor,
            pattern,
            count,
        } => {
            let pattern = pattern.map(|p| GlobPattern::new(p.to_vec()));
            let count = count.unwrap_or(DEFAULT_SCAN_COUNT);
            reply(
                keyspace.execute(|ks| ks.zscan(&key, cursor, count, pattern.as_ref())),
                |(next, entries)| {
                    Frame::Array(vec![
                        Frame::bulk(next.to_string()),
                        entries_frame(entries, true),
                    ])
                },
            )
        }

        Command::ConfigGet { pattern } => Frame::Map(
            registry
                .get_matching(&pattern)
                .into_iter()
                .map(|(name, value)| (Frame::bulk(name), Frame::bulk(value)))
                .collect(),
        ),

        Command::ConfigSet { param, value } => match registry.set(&param, &value) {
            Ok(()) => {
                keyspace.set_config(registry.keyspace_config());
                Frame::ok()
            }
            Err(msg) => {
                warn!(param = %param, value = %value, "rejected CONFIG SET");
                Frame::Error(msg)
            }
        },

        Command::Unknown(name) => Frame::Error(format!("ERR unknown command '{name}'")),
    }
}

/// Maps an engine result to a reply, turning errors into error frames.
fn reply<T>(result: Result<T, ZSetError>, ok: impl FnOnce(T) -> Frame) -> Frame {
    match result {
        Ok(value) => ok(value),
        Err(e) => Frame::Error(e.to_string()),
    }
}

fn integer(n: usize) -> Frame {
    Frame::Integer(n as i64)
}

fn score_frame(score: f64) -> Frame {
    Frame::Bulk(Bytes::from(format_score(score)))
}

fn optional_score(score: Option<f64>) -> Frame {
    score.map_or(Frame::Null, score_frame)
}

fn entries_frame(entries: Vec<Entry>, with_scores: bool) -> Frame {
    Frame::bulk_array(flatten(entries, with_scores))
}

/// Turns a parsed `RangeSpec` into an engine query, parsing score and lex
/// bounds.
fn build_query(
    range: RangeSpec,
    rev: bool,
    limit: Option<RangeLimit>,
) -> Result<RangeQuery, ZSetError> {
    let query = match range {
        RangeSpec::Rank { start, stop } => RangeQuery::by_rank(start, stop),
        RangeSpec::Score { min, max } => RangeQuery::by_score(ScoreRange::parse(&min, &max)?),
        RangeSpec::Lex { min, max } => RangeQuery::by_lex(LexRange::parse(&min, &max)?),
    };
    let limit = limit.map_or(Limit::NONE, |l| Limit::new(l.offset, l.count));
    Ok(query.reversed(rev).limited(limit))
}

fn store_inputs(args: &StoreArgs) -> (&str, Vec<(&str, f64)>, Aggregate) {
    let sources = args
        .keys
        .iter()
        .map(String::as_str)
        .zip(args.weights.iter().copied())
        .collect();
    let aggregate = match args.aggregate {
        StoreAggregate::Sum => Aggregate::Sum,
        StoreAggregate::Min => Aggregate::Min,
        StoreAggregate::Max => Aggregate::Max,
    };
    (args.dest.as_str(), sources, aggregate)
}
