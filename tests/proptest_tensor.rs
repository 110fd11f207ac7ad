//! Property tests for tensor reshape and fold
//!
//! Tests structural properties of dense tensors using proptest.


use generators::{arb_bool_tensor, arb_int_tensor_and_perm, arb_int_tensor_with_shape, arb_shape, invert};
use proptest::prelude::*;
use relsat::Tensor;

// ============================================================================
// Reshape
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Permuting axes and permuting back is the identity
    #[test]
    fn permute_roundtrip((tensor, perm) in arb_int_tensor_and_perm(0..=4)) {
        let there = tensor.permute(&perm).unwrap();
        let back = there.permute(&invert(&perm)).unwrap();
        prop_assert_eq!(back, tensor);
    }

    /// Permuting moves each cell to the permuted index
    #[test]
    fn permute_moves_cells((tensor, perm) in arb_int_tensor_and_perm(1..=4)) {
        let moved = tensor.permute(&perm).unwrap();
        for index in relsat::tensor::IndexIter::new(tensor.shape()) {
            let mut target = vec![0; index.len()];
            for (i, &p) in perm.iter().enumerate() {
                target[p] = index[i];
            }
            prop_assert_eq!(moved.get(&target), tensor.get(&index));
        }
    }

    /// Broadcasting along a new axis and taking the diagonal back is the identity
    #[test]
    fn broadcast_then_diagonal(shape in arb_shape(1..=3, 4)) {
        let tensor = Tensor::generate(&shape, |i| i.iter().map(|&x| x as i64 * 7 + 1).product::<i64>());
        let order = shape.len();

        // Duplicate the first axis: new shape [s0, s0, s1, ...]
        let mut wide = vec![shape[0]];
        wide.extend_from_slice(&shape);
        let keep: Vec<usize> = (1..=order).collect();
        let broadcast = tensor.reshape(&wide, &keep).unwrap();

        // Old axes 0 and 1 of `broadcast` both land on new axis 0
        let mut diag_map = vec![0];
        diag_map.extend(0..order);
        let diagonal = broadcast.reshape(&shape, &diag_map).unwrap();
        prop_assert_eq!(diagonal, tensor);
    }

    /// Stacking and unstacking round-trips
    #[test]
    fn concat_roundtrip(shape in arb_shape(0..=3, 3), count in 1usize..4) {
        let parts: Vec<Tensor<usize>> = (0..count)
            .map(|c| Tensor::generate(&shape, |i| c * 100 + i.iter().sum::<usize>()))
            .collect();
        let stacked = Tensor::concat(&parts).unwrap();
        prop_assert_eq!(stacked.shape().last(), Some(&count));
        prop_assert_eq!(stacked.unconcat().unwrap(), parts);
    }

    /// A mismatched axis map is rejected rather than misread
    #[test]
    fn reshape_rejects_wrong_sizes(shape in arb_shape(1..=3, 4)) {
        let tensor = Tensor::constant(&shape, 0u8);
        let mut bigger = shape.clone();
        bigger[0] += 1;
        let identity: Vec<usize> = (0..shape.len()).collect();
        prop_assert!(tensor.reshape(&bigger, &identity).is_err());
        prop_assert!(tensor.reshape(&shape, &identity[1..]).is_err());
    }
}

// ============================================================================
// Fold
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Folding k axes at once equals folding them one at a time
    #[test]
    fn fold_in_steps(tensor in arb_bool_tensor(2..=4)) {
        let at_once = tensor.fold(2, |xs| xs.iter().any(|&b| b));
        let stepwise = tensor
            .fold(1, |xs| xs.iter().any(|&b| b))
            .fold(1, |xs| xs.iter().any(|&b| b));
        prop_assert_eq!(at_once, stepwise);

        let parity = |xs: &[bool]| xs.iter().fold(false, |a, &b| a ^ b);
        prop_assert_eq!(tensor.fold(2, parity), tensor.fold(1, parity).fold(1, parity));
    }

    /// The result of folding does not depend on the order of the folded axes
    #[test]
    fn fold_order_independent((tensor, perm) in arb_int_tensor_and_perm(2..=4)) {
        let k = tensor.order();
        let full = tensor.fold(k, |xs| xs.iter().sum::<i64>());
        let permuted = tensor.permute(&perm).unwrap().fold(k, |xs| xs.iter().sum::<i64>());
        prop_assert_eq!(full, permuted);

        // Swapping the two leading axes leaves a fold over both unchanged
        let mut swap: Vec<usize> = (0..k).collect();
        swap.swap(0, 1);
        let swapped = tensor.permute(&swap).unwrap();
        prop_assert_eq!(
            tensor.fold(2, |xs| xs.iter().sum::<i64>()),
            swapped.fold(2, |xs| xs.iter().sum::<i64>())
        );
    }

    /// Folding zero axes wraps each cell in a singleton slice
    #[test]
    fn fold_zero_axes(tensor in arb_shape(0..=3, 3).prop_flat_map(arb_int_tensor_with_shape)) {
        prop_assert_eq!(tensor.fold(0, |xs| xs[0]), tensor);
    }
}
