//! Common test utilities
#![allow(dead_code)]

use numr_where::dtype::Element;
use numr_where::runtime::cpu::{CpuClient, CpuDevice, ParallelismConfig};
use numr_where::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Create a CPU client and device for testing
pub fn create_cpu_client() -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuClient::new(device.clone());
    (client, device)
}

/// CPU client that never splits work across threads
pub fn create_serial_client() -> CpuClient {
    CpuClient::new(CpuDevice::new()).with_parallelism(ParallelismConfig::serial())
}

/// Deterministic RNG so failures reproduce
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random shape with up to `max_ndim` dims of size `1..=max_dim`
pub fn random_shape(rng: &mut StdRng, max_ndim: usize, max_dim: usize) -> Vec<usize> {
    let ndim = rng.random_range(0..=max_ndim);
    (0..ndim).map(|_| rng.random_range(1..=max_dim)).collect()
}

/// A shape that broadcasts to `shape`: some dims set to 1, some leading dims dropped
pub fn broadcastable_from(rng: &mut StdRng, shape: &[usize]) -> Vec<usize> {
    let drop = rng.random_range(0..=shape.len());
    shape[drop..]
        .iter()
        .map(|&d| if rng.random_bool(0.3) { 1 } else { d })
        .collect()
}

/// Random Bool tensor
pub fn random_bools(rng: &mut StdRng, shape: &[usize]) -> Tensor {
    let n: usize = shape.iter().product();
    let data: Vec<bool> = (0..n).map(|_| rng.random_bool(0.5)).collect();
    Tensor::from_bools(&data, shape)
}

/// Random tensor with small integer values, exactly representable in every dtype
pub fn random_small_ints<T: Element>(rng: &mut StdRng, shape: &[usize]) -> Tensor {
    let n: usize = shape.iter().product();
    let data: Vec<T> = (0..n)
        .map(|_| T::from_i128(rng.random_range(0..100) as i128))
        .collect();
    Tensor::from_slice(&data, shape)
}

/// Reference select computed with plain loops over broadcast index math
pub fn reference_where<T: Element>(
    cond: &Tensor,
    x: &Tensor,
    y: &Tensor,
    shape: &[usize],
) -> Vec<T> {
    let cond = cond.broadcast_to(shape).unwrap().to_bools().unwrap();
    let x = x.broadcast_to(shape).unwrap().to_vec::<T>();
    let y = y.broadcast_to(shape).unwrap().to_vec::<T>();
    cond.iter()
        .zip(x.iter().zip(y.iter()))
        .map(|(&c, (&a, &b))| if c { a } else { b })
        .collect()
}

/// Assert two slices are equal bit for bit, element by element
pub fn assert_bits_eq<T: Element>(a: &[T], b: &[T], msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert_eq!(
            bytemuck::bytes_of(x),
            bytemuck::bytes_of(y),
            "{}: element {} differs: {:?} vs {:?}",
            msg,
            i,
            x,
            y
        );
    }
}
