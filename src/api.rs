//! The byte-buffer surface: integers travel as caller-encoded byte buffers and keys as blobs.
//!
//! Every function either succeeds or returns an error without having written any caller-supplied
//! output buffer.
use rand::{CryptoRng, RngCore};
use rayon::prelude::{
    IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator, ParallelSlice,
};
use tracing::debug;

use crate::{
    group::{add_mod, bits_to_bytes, decode_uint, encode_uint, mask, Endianness},
    params::{Params, Sizes, MAX_RANGE_BITS},
    point::{bgi18::Bgi18, PointFunction, DPF},
    Error, Key, Result, FSS,
};

/// Log a rejected call at the boundary, passing the result through
fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    result.map_err(|error| {
        debug!(operation, status = %error.status(), %error, "call rejected");
        error
    })
}

/// Buffer sizes for a key pair with the given widths
pub fn gen_sizes(domain_bits: u8, range_bits: u8) -> Result<Sizes> {
    logged("gen_sizes", crate::params::sizes(domain_bits, range_bits))
}

/// Validate and decode everything `gen` needs: widths first, then `alpha`, then `beta`
fn point_function(
    domain_bits: u8,
    range_bits: u8,
    alpha: &[u8],
    beta: &[u8],
    endianness: Endianness,
) -> Result<PointFunction> {
    let params = Params::new(domain_bits, range_bits)?;
    let alpha = decode_uint(alpha, endianness, domain_bits)?;
    let beta = decode_uint(beta, endianness, range_bits)?;
    PointFunction::new(params, alpha, beta)
}

fn check_randomness(params: &Params, rand_buf: &[u8]) -> Result<()> {
    let needed = params.rand_buf_size();
    match rand_buf.len() < needed {
        true => Err(Error::InsufficientRandomness {
            needed,
            actual: rand_buf.len(),
        }),
        false => Ok(()),
    }
}

/// Generate a key pair for the point function `alpha -> beta`, returning both key blobs.
/// `rand_buf` must hold at least `rand_buf_size` uniformly random bytes and must not be reused.
pub fn gen(
    domain_bits: u8,
    range_bits: u8,
    alpha: &[u8],
    beta: &[u8],
    endianness: Endianness,
    rand_buf: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    logged(
        "gen",
        point_function(domain_bits, range_bits, alpha, beta, endianness).and_then(|f| {
            check_randomness(&f.params, rand_buf)?;
            let (key_0, key_1) = Bgi18::gen(&f, rand_buf)?;
            Ok((key_0.to_bytes()?, key_1.to_bytes()?))
        }),
    )
}

/// Same as `gen`, writing the blobs into caller buffers of exactly `key_blob_size` bytes
#[allow(clippy::too_many_arguments)]
pub fn gen_into(
    domain_bits: u8,
    range_bits: u8,
    alpha: &[u8],
    beta: &[u8],
    endianness: Endianness,
    rand_buf: &[u8],
    key_0_out: &mut [u8],
    key_1_out: &mut [u8],
) -> Result<()> {
    let result = point_function(domain_bits, range_bits, alpha, beta, endianness).and_then(|f| {
        let size = f.params.key_blob_size();
        if key_0_out.len() != size || key_1_out.len() != size {
            return Err(Error::InvalidParameter(
                "key output buffers must be exactly key_blob_size bytes",
            ));
        }
        check_randomness(&f.params, rand_buf)?;

        // Serialize both keys before touching either output
        let (key_0, key_1) = Bgi18::gen(&f, rand_buf)?;
        let (blob_0, blob_1) = (key_0.to_bytes()?, key_1.to_bytes()?);
        if blob_0.len() != size || blob_1.len() != size {
            return Err(Error::Internal("serialized key has the wrong size"));
        }
        key_0_out.copy_from_slice(&blob_0);
        key_1_out.copy_from_slice(&blob_1);
        Ok(())
    });
    logged("gen_into", result)
}

/// Same as `gen`, drawing exactly `rand_buf_size` bytes from `rng`
pub fn gen_with_rng<RNG: CryptoRng + RngCore>(
    domain_bits: u8,
    range_bits: u8,
    alpha: &[u8],
    beta: &[u8],
    endianness: Endianness,
    rng: &mut RNG,
) -> Result<(Vec<u8>, Vec<u8>)> {
    logged(
        "gen_with_rng",
        point_function(domain_bits, range_bits, alpha, beta, endianness).and_then(|f| {
            let (key_0, key_1) = Bgi18::gen_with_rng(&f, rng)?;
            Ok((key_0.to_bytes()?, key_1.to_bytes()?))
        }),
    )
}

/// Generate one key pair per element of the packed `alphas` and `betas`, returning the packed
/// party-0 blobs and the packed party-1 blobs in the same order. Pair `i` consumes the `i`-th
/// `rand_buf_size` chunk of `rand_bufs`.
#[allow(clippy::too_many_arguments)]
pub fn map_gen(
    domain_bits: u8,
    range_bits: u8,
    alphas: &[u8],
    alpha_size: usize,
    alpha_endianness: Endianness,
    betas: &[u8],
    beta_size: usize,
    beta_endianness: Endianness,
    rand_bufs: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let result = (|| -> Result<(Vec<u8>, Vec<u8>)> {
        let params = Params::new(domain_bits, range_bits)?;
        let alphas = packed(alphas, alpha_size)?;
        let betas = packed(betas, beta_size)?;
        if alphas.len() != betas.len() {
            return Err(Error::InvalidParameter("alphas and betas have different lengths"));
        }
        let functions = alphas
            .zip(betas)
            .map(|(alpha, beta)| -> Result<PointFunction> {
                let alpha = decode_uint(alpha, alpha_endianness, domain_bits)?;
                let beta = decode_uint(beta, beta_endianness, range_bits)?;
                PointFunction::new(params, alpha, beta)
            })
            .collect::<Result<Vec<_>>>()?;

        let rand_buf_size = params.rand_buf_size();
        let needed = functions.len() * rand_buf_size;
        if rand_bufs.len() < needed {
            return Err(Error::InsufficientRandomness {
                needed,
                actual: rand_bufs.len(),
            });
        }

        let blobs = functions
            .par_iter()
            .zip(rand_bufs[..needed].par_chunks_exact(rand_buf_size))
            .map(|(f, rand_buf)| -> Result<(Vec<u8>, Vec<u8>)> {
                let (key_0, key_1) = Bgi18::gen(f, rand_buf)?;
                Ok((key_0.to_bytes()?, key_1.to_bytes()?))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = blobs.len(), domain_bits, range_bits, "generated key pairs");
        let (blobs_0, blobs_1): (Vec<_>, Vec<_>) = blobs.into_iter().unzip();
        Ok((blobs_0.concat(), blobs_1.concat()))
    })();
    logged("map_gen", result)
}

/// Parse a key blob produced by `gen`
pub fn parse_key(blob: &[u8]) -> Result<Key> {
    let key = logged("parse_key", Key::from_bytes(blob))?;
    debug!(
        party = key.party(),
        domain_bits = key.domain_bits(),
        range_bits = key.range_bits(),
        "parsed key"
    );
    Ok(key)
}

/// Evaluate `key` at the encoded input `x`, returning the `ceil(range_bits / 8)`-byte share
pub fn eval(key: &Key, x: &[u8], endianness: Endianness) -> Result<Vec<u8>> {
    let mut y = vec![0u8; key.params().range_bytes()];
    eval_into(key, x, endianness, &mut y)?;
    Ok(y)
}

/// Evaluate `key` at the encoded input `x` into `y_out`, which must hold at least
/// `ceil(range_bits / 8)` bytes. The share is zero-extended to the whole of `y_out`.
pub fn eval_into(key: &Key, x: &[u8], endianness: Endianness, y_out: &mut [u8]) -> Result<()> {
    let result = decode_uint(x, endianness, key.domain_bits()).and_then(|x| {
        if y_out.len() < key.params().range_bytes() {
            return Err(Error::InvalidParameter("output buffer is too short"));
        }
        let share = Bgi18::eval(key, &x)?;
        encode_uint(share.value, endianness, y_out);
        Ok(())
    });
    logged("eval_into", result)
}

/// Split a packed integer array into its elements
fn packed<'a>(buf: &'a [u8], size: usize) -> Result<std::slice::ChunksExact<'a, u8>> {
    if size == 0 || buf.is_empty() || buf.len() % size != 0 {
        return Err(Error::InvalidParameter(
            "packed buffer must be a non-empty whole number of elements",
        ));
    }
    Ok(buf.chunks_exact(size))
}

fn eval_shares(key: &Key, xs: &[u8], x_size: usize, endianness: Endianness) -> Result<Vec<u64>> {
    packed(xs, x_size)?
        .map(|x| -> Result<u64> {
            let x = decode_uint(x, endianness, key.domain_bits())?;
            Ok(Bgi18::eval(key, &x)?.value)
        })
        .collect()
}

fn encode_all(values: &[u64], width: usize, endianness: Endianness) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * width];
    out.chunks_exact_mut(width)
        .zip(values)
        .for_each(|(y, v)| encode_uint(*v, endianness, y));
    out
}

/// Evaluate `key` at every `x_size`-byte input packed in `xs`. The shares come back packed in
/// `ceil(range_bits / 8)`-byte elements.
pub fn map_eval(key: &Key, xs: &[u8], x_size: usize, endianness: Endianness) -> Result<Vec<u8>> {
    let result = eval_shares(key, xs, x_size, endianness)
        .map(|ys| encode_all(&ys, key.params().range_bytes(), endianness));
    if let Ok(ys) = &result {
        debug!(
            party = key.party(),
            count = ys.len() / key.params().range_bytes(),
            "evaluated batch"
        );
    }
    logged("map_eval", result)
}

/// Sum the `y_size`-byte integers packed in `ys` modulo `2^range_bits`
pub fn reduce_sum(
    range_bits: u8,
    ys: &[u8],
    y_size: usize,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let result = (|| -> Result<Vec<u8>> {
        if range_bits == 0 || range_bits > MAX_RANGE_BITS {
            return Err(Error::InvalidParameter("range_bits must be in 1..=64"));
        }
        let width = bits_to_bytes(range_bits);
        if y_size < width {
            return Err(Error::InvalidParameter("y_size is narrower than the range"));
        }
        let mut sum = 0u64;
        for y in packed(ys, y_size)? {
            sum = add_mod(range_bits, sum, decode_uint(y, endianness, range_bits)?);
        }
        let mut out = vec![0u8; width];
        encode_uint(sum, endianness, &mut out);
        Ok(out)
    })();
    logged("reduce_sum", result)
}

/// This party's share of the sum of the point function over every input packed in `xs`
pub fn map_eval_reduce_sum(
    key: &Key,
    xs: &[u8],
    x_size: usize,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let result = eval_shares(key, xs, x_size, endianness).map(|ys| {
        let range_bits = key.range_bits();
        let sum = ys.into_iter().fold(0, |acc, y| add_mod(range_bits, acc, y));
        let mut out = vec![0u8; key.params().range_bytes()];
        encode_uint(sum, endianness, &mut out);
        out
    });
    logged("map_eval_reduce_sum", result)
}

/// Evaluate `key` at every input whose top `prefix_bits` bits are `prefix`, in increasing order
pub fn eval_all(
    key: &Key,
    prefix: &[u8],
    prefix_bits: u8,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let result = decode_uint(prefix, endianness, 64)
        .and_then(|prefix| Bgi18::eval_all(key, prefix, prefix_bits))
        .map(|ys| encode_all(&ys, key.params().range_bytes(), endianness));
    logged("eval_all", result)
}

/// Parameters shared by every key of a batch, checked small enough for a full evaluation
fn common_params(keys: &[Key]) -> Result<Params> {
    let params = keys
        .first()
        .ok_or(Error::InvalidParameter("no keys to evaluate"))?
        .params();
    if keys.iter().any(|k| k.params() != params) {
        return Err(Error::InvalidParameter("keys have different parameters"));
    }
    if params.domain_bits() > crate::MAX_EVAL_ALL_BITS {
        return Err(Error::InvalidParameter("too many inputs to evaluate at once"));
    }
    Ok(params)
}

fn thread_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|_| Error::Internal("failed to build the evaluation thread pool"))
}

/// Element-wise sum of the full-domain evaluations of `keys`, which must all have the same
/// parameters. Runs on a dedicated pool of `threads` workers, or rayon's default when zero.
pub fn eval_all_sum(keys: &[Key], endianness: Endianness, threads: usize) -> Result<Vec<u8>> {
    let result = (|| -> Result<Vec<u8>> {
        let params = common_params(keys)?;
        let pool = thread_pool(threads)?;
        let range_bits = params.range_bits();

        let sums = pool
            .install(|| {
                keys.par_iter()
                    .map(|key| Bgi18::eval_all(key, 0, 0))
                    .try_reduce_with(|mut acc, ys| {
                        acc.iter_mut()
                            .zip(ys)
                            .for_each(|(a, y)| *a = add_mod(range_bits, *a, y));
                        Ok(acc)
                    })
            })
            .ok_or(Error::Internal("no evaluations to sum"))??;

        debug!(
            keys = keys.len(),
            domain_bits = params.domain_bits(),
            range_bits,
            "summed full-domain evaluations"
        );
        Ok(encode_all(&sums, params.range_bytes(), endianness))
    })();
    logged("eval_all_sum", result)
}

/// For each key, the inner product of its full-domain evaluation with the database `ys` modulo
/// `2^range_bits`. `ys` packs one `y_size`-byte entry per input. With `beta = 1` the two parties'
/// results sum to the entry at `alpha`.
pub fn eval_all_dot(
    keys: &[Key],
    ys: &[u8],
    y_size: usize,
    endianness: Endianness,
    threads: usize,
) -> Result<Vec<u8>> {
    let result = (|| -> Result<Vec<u8>> {
        let params = common_params(keys)?;
        let range_bits = params.range_bits();
        if y_size < params.range_bytes() {
            return Err(Error::InvalidParameter("y_size is narrower than the range"));
        }
        if y_size.checked_mul(1 << params.domain_bits()) != Some(ys.len()) {
            return Err(Error::InvalidParameter("ys must hold one entry per input"));
        }
        let database = packed(ys, y_size)?
            .map(|y| decode_uint(y, endianness, range_bits))
            .collect::<Result<Vec<_>>>()?;
        let pool = thread_pool(threads)?;

        let dots = pool.install(|| {
            keys.par_iter()
                .map(|key| -> Result<u64> {
                    let shares = Bgi18::eval_all(key, 0, 0)?;
                    let dot = shares
                        .iter()
                        .zip(&database)
                        .fold(0u64, |acc, (s, y)| acc.wrapping_add(s.wrapping_mul(*y)));
                    Ok(dot & mask(range_bits))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        debug!(
            keys = keys.len(),
            domain_bits = params.domain_bits(),
            range_bits,
            "computed full-domain inner products"
        );
        Ok(encode_all(&dots, params.range_bytes(), endianness))
    })();
    logged("eval_all_dot", result)
}
