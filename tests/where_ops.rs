//! Integration tests for conditional select (`where_out` / `where_cond`)

mod common;

use common::{
    assert_bits_eq, broadcastable_from, create_cpu_client, create_serial_client, random_bools,
    random_shape, random_small_ints, reference_where, seeded_rng,
};
use half::{bf16, f16};
use numr_where::dtype::{Bool8, DType, TypePromotion};
use numr_where::error::Error;
use numr_where::ops::{ConditionalOps, SelectPath, broadcast_shapes};
use numr_where::runtime::cpu::ParallelismConfig;
use numr_where::tensor::{Layout, MemoryFormat, ShapeDynamism, Storage, Tensor};
use smallvec::SmallVec;

// ============================================================================
// Basic semantics
// ============================================================================

#[test]
fn test_where_same_shape_matches_elementwise_definition() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false, true, false, false, true], &[2, 3]);
    let x = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let y = Tensor::from_slice(&[10.0f64, 20.0, 30.0, 40.0, 50.0, 60.0], &[2, 3]);
    let mut out = Tensor::zeros(&[2, 3], DType::F64);

    client.where_out(&cond, &x, &y, &mut out).unwrap();
    assert_eq!(out.to_vec::<f64>(), [1.0, 20.0, 3.0, 40.0, 50.0, 6.0]);
}

#[test]
fn test_where_broadcast_condition() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true], &[1]);
    let x = Tensor::from_slice(&[1i32, 2, 3], &[3]);
    let y = Tensor::from_slice(&[4i32, 5, 6], &[3]);
    let mut out = Tensor::zeros(&[3], DType::I32);

    client.where_out(&cond, &x, &y, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>(), [1, 2, 3]);

    let cond = Tensor::from_bools(&[false], &[1]);
    client.where_out(&cond, &x, &y, &mut out).unwrap();
    assert_eq!(out.to_vec::<i32>(), [4, 5, 6]);
}

#[test]
fn test_where_returns_out_for_chaining() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false], &[2]);
    let x = Tensor::from_slice(&[1u8, 2], &[2]);
    let y = Tensor::from_slice(&[3u8, 4], &[2]);
    let mut out = Tensor::zeros(&[2], DType::U8);

    let shape = client.where_out(&cond, &x, &y, &mut out).unwrap().shape().to_vec();
    assert_eq!(shape, [2]);
    assert_eq!(out.to_vec::<u8>(), [1, 4]);
}

#[test]
fn test_where_three_way_broadcast() {
    let (client, _device) = create_cpu_client();

    // cond [2, 1, 1], x [3, 1], y [4] -> [2, 3, 4]
    let cond = Tensor::from_bools(&[true, false], &[2, 1, 1]);
    let x = Tensor::from_slice(&[1i16, 2, 3], &[3, 1]);
    let y = Tensor::from_slice(&[-1i16, -2, -3, -4], &[4]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.shape(), &[2, 3, 4]);

    let data = out.to_vec::<i16>();
    assert_eq!(&data[..12], &[1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
    assert_eq!(&data[12..], &[-1, -2, -3, -4, -1, -2, -3, -4, -1, -2, -3, -4]);
}

#[test]
fn test_where_bool_values() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false, true], &[3]);
    let x = Tensor::from_bools(&[false, false, false], &[3]);
    let y = Tensor::from_bools(&[true, true, true], &[3]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.dtype(), DType::Bool);
    assert_eq!(out.to_bools().unwrap(), [false, true, false]);
}

#[test]
fn test_where_scalar_operands() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true], &[]);
    let x = Tensor::from_slice(&[7u64], &[]);
    let y = Tensor::from_slice(&[9u64], &[]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.ndim(), 0);
    assert_eq!(out.to_vec::<u64>(), [7]);
}

// ============================================================================
// Error handling
// ============================================================================

#[test]
fn test_where_incompatible_shapes_leaves_out_untouched() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false], &[2]);
    let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]);
    let y = Tensor::from_slice(&[4.0f32, 5.0, 6.0], &[3]);
    let mut out = Tensor::from_slice(&[-7.0f32, -8.0, -9.0], &[3]);

    let err = client.where_out(&cond, &x, &y, &mut out).unwrap_err();
    assert!(matches!(err, Error::IncompatibleShapes { .. }), "{err}");
    assert_eq!(out.shape(), &[3]);
    assert_eq!(out.to_vec::<f32>(), [-7.0, -8.0, -9.0]);
}

#[test]
fn test_where_promoted_type_must_match_out() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false], &[2]);
    let x = Tensor::from_slice(&[1.5f32, 2.5], &[2]);
    let y = Tensor::from_slice(&[3i32, 4], &[2]);

    assert_eq!(TypePromotion::of(DType::F32, DType::I32).unwrap().common, DType::F32);

    let mut out = Tensor::from_slice(&[0i32, 0], &[2]);
    let err = client.where_out(&cond, &x, &y, &mut out).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }), "{err}");
    assert_eq!(out.to_vec::<i32>(), [0, 0]);

    let mut out = Tensor::zeros(&[2], DType::F32);
    client.where_out(&cond, &x, &y, &mut out).unwrap();
    assert_eq!(out.to_vec::<f32>(), [1.5, 4.0]);
}

#[test]
fn test_where_no_common_type() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true], &[1]);
    let x = Tensor::from_slice(&[1i8], &[1]);
    let y = Tensor::from_slice(&[1u64], &[1]);

    let err = client.where_cond(&cond, &x, &y).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }), "{err}");
}

#[test]
fn test_where_unaddressable_broadcast_rejected() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true], &[1]).broadcast_to(&[1 << 40, 1]).unwrap();
    let x = Tensor::from_slice(&[1u8], &[1]).broadcast_to(&[1 << 40]).unwrap();
    let mut out = Tensor::from_slice(&[9u8], &[1]);

    let err = client.where_out(&cond, &x, &x, &mut out).unwrap_err();
    assert!(matches!(err, Error::IncompatibleShapes { .. }), "{err}");
    assert_eq!(out.shape(), &[1]);
    assert_eq!(out.to_vec::<u8>(), [9]);

    assert!(x.broadcast_to(&[1 << 40, 1 << 40]).is_err());
}

#[test]
fn test_where_reversed_strides() {
    let (client, _device) = create_cpu_client();

    let storage = Storage::from_slice(&[1.0f32, 2.0, 3.0, 4.0]);
    let reversed = Layout::new(SmallVec::from_slice(&[4]), SmallVec::from_slice(&[-1]), 3);
    let x = Tensor::from_parts(storage.clone(), reversed).unwrap();
    let y = Tensor::from_slice(&[0.0f32], &[1]);
    let cond = Tensor::from_bools(&[true, true, false, true], &[4]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.to_vec::<f32>(), [4.0, 3.0, 0.0, 1.0]);

    let before_start = Layout::new(SmallVec::from_slice(&[4]), SmallVec::from_slice(&[-1]), 0);
    let err = Tensor::from_parts(storage, before_start).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }), "{err}");
}

#[test]
fn test_where_resize_policies() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false, true, false], &[4]);
    let x = Tensor::from_slice(&[1u32, 2, 3, 4], &[4]);
    let y = Tensor::from_slice(&[0u32], &[1]);

    let mut fixed = Tensor::zeros(&[2], DType::U32).with_dynamism(ShapeDynamism::Static);
    let err = client.where_out(&cond, &x, &y, &mut fixed).unwrap_err();
    assert!(matches!(err, Error::ResizeFailed { .. }), "{err}");
    assert_eq!(fixed.shape(), &[2]);

    let mut bounded = Tensor::zeros(&[2], DType::U32).with_dynamism(ShapeDynamism::DynamicBound);
    let err = client.where_out(&cond, &x, &y, &mut bounded).unwrap_err();
    assert!(matches!(err, Error::ResizeFailed { .. }), "{err}");

    let mut roomy = Tensor::zeros(&[2, 3], DType::U32).with_dynamism(ShapeDynamism::DynamicBound);
    client.where_out(&cond, &x, &y, &mut roomy).unwrap();
    assert_eq!(roomy.shape(), &[4]);
    assert_eq!(roomy.to_vec::<u32>(), [1, 0, 3, 0]);

    let mut grows = Tensor::empty(DType::U32);
    client.where_out(&cond, &x, &y, &mut grows).unwrap();
    assert_eq!(grows.to_vec::<u32>(), [1, 0, 3, 0]);
}

#[test]
fn test_where_mismatched_memory_order() {
    let (client, _device) = create_cpu_client();

    let shape = [1, 3, 2, 2];
    let cond = Tensor::from_bools(&[true; 12], &shape);
    let x = Tensor::from_slice(&[1.0f32; 12], &shape);
    let y = Tensor::zeros_channels_last(&shape, DType::F32).unwrap();
    assert_eq!(y.layout().memory_format(), MemoryFormat::ChannelsLast);

    let mut out = Tensor::zeros(&shape, DType::F32);
    let err = client.where_out(&cond, &x, &y, &mut out).unwrap_err();
    assert!(matches!(err, Error::MismatchedLayout { .. }), "{err}");
    assert_eq!(out.to_vec::<f32>(), [0.0; 12]);
}

#[test]
fn test_where_rejects_aliased_output() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[false, true], &[2]);
    let mut out = Tensor::from_slice(&[1i64, 2], &[2]);
    let view = out.clone();

    let err = client.where_out(&cond, &view, &view, &mut out).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }), "{err}");

    drop(view);
    let x = Tensor::from_slice(&[5i64, 6], &[2]);
    client.where_out(&cond, &x, &x, &mut out).unwrap();
    assert_eq!(out.to_vec::<i64>(), [5, 6]);
}

// ============================================================================
// Layouts
// ============================================================================

#[test]
fn test_where_transposed_inputs() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false, true, false, true, false], &[3, 2])
        .transpose(0, 1)
        .unwrap();
    let x = Tensor::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3]);
    let y = Tensor::from_slice(&[10i32, 20, 30, 40, 50, 60], &[3, 2])
        .transpose(0, 1)
        .unwrap();

    // cond^T = [[T, T, T], [F, F, F]], y^T = [[10, 30, 50], [20, 40, 60]]
    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.to_vec::<i32>(), [1, 2, 3, 20, 40, 60]);
}

#[test]
fn test_where_channels_last_operands() {
    let (client, _device) = create_cpu_client();
    let mut rng = seeded_rng(7);

    let shape = [2, 3, 4, 5];
    let cond = random_bools(&mut rng, &shape);
    let x = random_small_ints::<f32>(&mut rng, &shape);
    let y = random_small_ints::<f32>(&mut rng, &shape);
    let expected = reference_where::<f32>(&cond, &x, &y, &shape);

    // Re-store every operand in NHWC order: same logical values, different strides
    let to_channels_last = |t: &Tensor| {
        let nhwc = t.permute(&[0, 2, 3, 1]).unwrap().contiguous();
        nhwc.permute(&[0, 3, 1, 2]).unwrap()
    };
    let cond_cl = to_channels_last(&cond);
    let x_cl = to_channels_last(&x);
    let y_cl = to_channels_last(&y);
    assert_eq!(x_cl.layout().memory_format(), MemoryFormat::ChannelsLast);

    let out = client.where_cond(&cond_cl, &x_cl, &y_cl).unwrap();
    assert_eq!(out.layout().memory_format(), MemoryFormat::ChannelsLast);
    assert_eq!(out.to_vec::<f32>(), expected);

    let mut out = Tensor::zeros_channels_last(&shape, DType::F32).unwrap();
    client.where_out(&cond_cl, &x_cl, &y_cl, &mut out).unwrap();
    assert_eq!(out.to_vec::<f32>(), expected);
}

#[test]
fn test_where_narrowed_views() {
    let (client, _device) = create_cpu_client();

    let base = Tensor::from_slice(&[0u16, 1, 2, 3, 4, 5, 6, 7], &[8]);
    let x = base.narrow(0, 2, 3).unwrap();
    let y = base.narrow(0, 5, 3).unwrap();
    let cond = Tensor::from_bools(&[true, false, true], &[3]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.to_vec::<u16>(), [2, 6, 4]);
}

// ============================================================================
// Dtypes and evaluator routing
// ============================================================================

#[test]
fn test_where_u8_condition_uses_fallback() {
    let (client, _device) = create_cpu_client();

    let promo = TypePromotion::of(DType::F32, DType::F32).unwrap();
    assert_eq!(
        SelectPath::choose(DType::U8, DType::F32, DType::F32, DType::F32, promo, true),
        SelectPath::Fallback
    );

    let cond = Tensor::from_slice(&[0u8, 1, 255, 0], &[4]);
    let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[4]);
    let y = Tensor::from_slice(&[-1.0f32, -2.0, -3.0, -4.0], &[4]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.to_vec::<f32>(), [-1.0, 2.0, 3.0, -4.0]);
}

#[test]
fn test_where_float_condition_truthiness() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_slice(&[0.0f64, -0.0, 0.5, f64::NAN], &[4]);
    let x = Tensor::from_slice(&[1i8, 1, 1, 1], &[4]);
    let y = Tensor::from_slice(&[0i8, 0, 0, 0], &[4]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.to_vec::<i8>(), [0, 0, 1, 1]);
}

#[test]
fn test_where_reduced_precision() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false, true], &[3]);
    let xs = [f16::from_f32(0.1), f16::from_f32(65504.0), f16::from_f32(-2.5)];
    let ys = [f16::from_f32(7.0), f16::from_f32(-0.0), f16::from_f32(1e-3)];
    let x = Tensor::from_slice(&xs, &[3]);
    let y = Tensor::from_slice(&ys, &[3]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.dtype(), DType::F16);
    assert_bits_eq(&out.to_vec::<f16>(), &[xs[0], ys[1], xs[2]], "f16 select");

    // F16 meets BF16 in F32
    let b = Tensor::from_slice(&[bf16::from_f32(3.0); 3], &[3]);
    let out = client.where_cond(&cond, &x, &b).unwrap();
    assert_eq!(out.dtype(), DType::F32);
    assert_eq!(out.to_vec::<f32>(), [xs[0].to_f32(), 3.0, -2.5]);
}

#[test]
fn test_where_mixed_integer_promotion() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[true, false], &[2]);
    let x = Tensor::from_slice(&[-5i32, -6], &[2]);
    let y = Tensor::from_slice(&[u32::MAX, 7], &[2]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.dtype(), DType::I64);
    assert_eq!(out.to_vec::<i64>(), [-5, 7]);

    let y = Tensor::from_slice(&[u32::MAX, u32::MAX], &[2]);
    let out = client.where_cond(&Tensor::from_bools(&[false, true], &[2]), &x, &y).unwrap();
    assert_eq!(out.to_vec::<i64>(), [u32::MAX as i64, -6]);
}

#[test]
fn test_where_bool_values_promote() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_slice(&[Bool8::TRUE, Bool8::FALSE], &[2]);
    let x = Tensor::from_bools(&[true, true], &[2]);
    let y = Tensor::from_slice(&[40u8, 41], &[2]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.dtype(), DType::U8);
    assert_eq!(out.to_vec::<u8>(), [1, 41]);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_where_random_broadcast_matches_reference() {
    let client = create_serial_client();
    let mut rng = seeded_rng(0x5eed);

    for case in 0..200 {
        let shape = random_shape(&mut rng, 4, 5);
        let cond_shape = broadcastable_from(&mut rng, &shape);
        let x_shape = broadcastable_from(&mut rng, &shape);
        let y_shape = broadcastable_from(&mut rng, &shape);
        let out_shape =
            broadcast_shapes(&[cond_shape.as_slice(), x_shape.as_slice(), y_shape.as_slice()])
                .unwrap();

        let cond = random_bools(&mut rng, &cond_shape);
        let x = random_small_ints::<i32>(&mut rng, &x_shape);
        let y = random_small_ints::<i32>(&mut rng, &y_shape);

        let out = client.where_cond(&cond, &x, &y).unwrap();
        assert_eq!(out.shape(), out_shape.as_slice(), "case {case}");
        assert_eq!(
            out.to_vec::<i32>(),
            reference_where::<i32>(&cond, &x, &y, &out_shape),
            "case {case}: cond {cond_shape:?}, x {x_shape:?}, y {y_shape:?}"
        );
    }
}

#[test]
fn test_where_fast_path_matches_fallback() {
    let client = create_serial_client();
    let mut rng = seeded_rng(42);

    for case in 0..100 {
        let shape = random_shape(&mut rng, 3, 6);
        let cond_shape = broadcastable_from(&mut rng, &shape);
        let y_shape = broadcastable_from(&mut rng, &shape);

        let cond = random_bools(&mut rng, &cond_shape);
        let x = random_small_ints::<f32>(&mut rng, &shape);
        let y = random_small_ints::<f32>(&mut rng, &y_shape);

        // Bool condition: typed path
        let fast = client.where_cond(&cond, &x, &y).unwrap();

        // Same mask stored as U8: converting fallback
        let mask: Vec<u8> = cond.to_bools().unwrap().into_iter().map(u8::from).collect();
        let cond_u8 = Tensor::from_slice(&mask, &cond_shape);
        let slow = client.where_cond(&cond_u8, &x, &y).unwrap();

        assert_bits_eq(&fast.to_vec::<f32>(), &slow.to_vec::<f32>(), &format!("case {case}"));
    }
}

#[test]
fn test_where_parallel_matches_serial() {
    let serial = create_serial_client();
    let parallel = create_serial_client().with_parallelism(ParallelismConfig::new(1, 97));
    let mut rng = seeded_rng(1234);

    let shape = [17, 33, 9];
    let cond = random_bools(&mut rng, &[17, 1, 9]);
    let x = random_small_ints::<u64>(&mut rng, &shape);
    let y = random_small_ints::<u64>(&mut rng, &[9]);

    let a = serial.where_cond(&cond, &x, &y).unwrap();
    let b = parallel.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(a.to_vec::<u64>(), b.to_vec::<u64>());

    let cond = random_bools(&mut rng, &shape);
    let a = serial.where_cond(&cond, &x, &x).unwrap();
    let b = parallel.where_cond(&cond, &x, &x).unwrap();
    assert_eq!(a.to_vec::<u64>(), b.to_vec::<u64>());
}

#[test]
fn test_where_is_idempotent() {
    let (client, _device) = create_cpu_client();
    let mut rng = seeded_rng(99);

    let cond = random_bools(&mut rng, &[4, 1]);
    let x = random_small_ints::<i64>(&mut rng, &[4, 6]);
    let y = random_small_ints::<i8>(&mut rng, &[6]);
    let mut out = Tensor::zeros(&[4, 6], DType::I64);

    client.where_out(&cond, &x, &y, &mut out).unwrap();
    let first = out.to_vec::<i64>();
    client.where_out(&cond, &x, &y, &mut out).unwrap();
    assert_eq!(out.to_vec::<i64>(), first);
}

#[test]
fn test_where_zero_sized_dimension() {
    let (client, _device) = create_cpu_client();

    let cond = Tensor::from_bools(&[], &[0]);
    let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3, 1]);
    let y = Tensor::from_slice(&[0.0f32], &[1]);

    let out = client.where_cond(&cond, &x, &y).unwrap();
    assert_eq!(out.shape(), &[3, 0]);
    assert_eq!(out.numel(), 0);
    assert!(out.to_vec::<f32>().is_empty());

    let mut out = Tensor::empty(DType::F32);
    client.where_out(&cond, &x, &y, &mut out).unwrap();
    assert_eq!(out.shape(), &[3, 0]);

    // Zero-sized dims also go through the converting path without writes
    let cond = Tensor::from_slice::<u8>(&[], &[2, 0]);
    let out = client.where_cond(&cond, &y, &y).unwrap();
    assert_eq!(out.shape(), &[2, 0]);
}
