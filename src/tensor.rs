//! Dense immutable tensors
//!
//! A tensor indexed by finite sets A₀, A₁, ..., Aₙ₋₁ is a function
//! [∏ᵢ Aᵢ] → E. We store it densely: one element per index tuple, with the
//! *first* axis varying fastest. Tensors are never mutated; every
//! transformation builds a new one.
//!
//! The element type is arbitrary. Over `bool` a tensor is a concrete
//! relation; over `Literal` it is a symbolic relation whose cells are SAT
//! variables. Two primitives carry all the structure:
//!
//! - **reshape**: move, broadcast and identify axes
//! - **fold**: aggregate the leading axes away
//!
//! Because the leading axes are the fastest varying ones, the sub-tensor a
//! fold aggregates is a contiguous slice of the store.

use crate::error::{Error, Result};

/// A dense tensor over element type `E`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tensor<E> {
    shape: Vec<usize>,
    elems: Vec<E>,
}

impl<E> Tensor<E> {
    /// Build a tensor by calling `f` once per index, in storage order.
    pub fn generate<F>(shape: &[usize], mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> E,
    {
        let mut elems = Vec::with_capacity(volume(shape));
        for_each_index(shape, |index| elems.push(f(index)));
        Self {
            shape: shape.to_vec(),
            elems,
        }
    }

    /// Wrap an element store laid out fastest-varying-first.
    pub fn from_vec(shape: &[usize], elems: Vec<E>) -> Result<Self> {
        let expected = volume(shape);
        if elems.len() != expected {
            return Err(Error::arity(expected, elems.len()));
        }
        Ok(Self {
            shape: shape.to_vec(),
            elems,
        })
    }

    /// A zero-dimensional tensor holding one element
    pub fn scalar(elem: E) -> Self {
        Self {
            shape: Vec::new(),
            elems: vec![elem],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes
    pub fn order(&self) -> usize {
        self.shape.len()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// True when some axis has size zero
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Element at the given index.
    ///
    /// # Panics
    /// Panics if the index has the wrong length or is out of range.
    pub fn get(&self, index: &[usize]) -> &E {
        assert_eq!(index.len(), self.shape.len(), "index has wrong arity");
        let mut offset = 0;
        let mut stride = 1;
        for (&i, &d) in index.iter().zip(&self.shape) {
            assert!(i < d, "index {} out of range for axis of size {}", i, d);
            offset += i * stride;
            stride *= d;
        }
        &self.elems[offset]
    }

    /// Elements in storage order
    pub fn elems(&self) -> &[E] {
        &self.elems
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.elems.iter()
    }

    pub fn into_elems(self) -> Vec<E> {
        self.elems
    }

    /// Unwrap a zero-dimensional tensor.
    pub fn into_scalar(mut self) -> Result<E> {
        if !self.shape.is_empty() {
            return Err(Error::arity(0, self.shape.len()));
        }
        Ok(self.elems.swap_remove(0))
    }

    /// Element-wise transformation
    pub fn map<R, F>(&self, f: F) -> Tensor<R>
    where
        F: FnMut(&E) -> R,
    {
        Tensor {
            shape: self.shape.clone(),
            elems: self.elems.iter().map(f).collect(),
        }
    }

    /// Element-wise combination of two tensors of identical shape.
    pub fn map2<U, R, F>(&self, other: &Tensor<U>, mut f: F) -> Result<Tensor<R>>
    where
        F: FnMut(&E, &U) -> R,
    {
        if self.shape != other.shape {
            return Err(Error::shape(&self.shape, &other.shape));
        }
        Ok(Tensor {
            shape: self.shape.clone(),
            elems: self
                .elems
                .iter()
                .zip(&other.elems)
                .map(|(a, b)| f(a, b))
                .collect(),
        })
    }

    /// Aggregate the first `k` axes away.
    ///
    /// Each cell of the result (indexed by the remaining axes) receives
    /// `sum` applied to the sub-tensor at that cell, given as a contiguous
    /// slice in storage order. `sum` should be associative and commutative
    /// for the result to be independent of layout.
    ///
    /// # Panics
    /// Panics if `k` exceeds the order of the tensor.
    pub fn fold<R, F>(&self, k: usize, mut sum: F) -> Tensor<R>
    where
        F: FnMut(&[E]) -> R,
    {
        assert!(k <= self.order(), "cannot fold {} axes of a tensor of order {}", k, self.order());
        let block = volume(&self.shape[..k]);
        let shape = self.shape[k..].to_vec();
        let cells = volume(&shape);
        let elems = (0..cells)
            .map(|c| sum(&self.elems[c * block..(c + 1) * block]))
            .collect();
        Tensor { shape, elems }
    }
}

impl<E: Clone> Tensor<E> {
    /// A tensor with every cell equal to `elem`
    pub fn constant(shape: &[usize], elem: E) -> Self {
        Self {
            shape: shape.to_vec(),
            elems: vec![elem; volume(shape)],
        }
    }

    /// Rearrange axes.
    ///
    /// `axis_map` has one entry per axis of `self`, naming the axis of the
    /// result it lands on. The result at index `n` is `self` at `o` where
    /// `o[i] = n[axis_map[i]]`. Result axes that no old axis lands on are
    /// broadcast; several old axes landing on one result axis select the
    /// diagonal. Each old axis keeps its size.
    pub fn reshape(&self, shape: &[usize], axis_map: &[usize]) -> Result<Self> {
        if axis_map.len() != self.order() {
            return Err(Error::arity(self.order(), axis_map.len()));
        }

        // Stride of each result axis inside the old store
        let mut strides = vec![0usize; shape.len()];
        let mut stride = 1;
        for (&old_dim, &target) in self.shape.iter().zip(axis_map) {
            if target >= shape.len() || shape[target] != old_dim {
                return Err(Error::shape(&self.shape, shape));
            }
            strides[target] += stride;
            stride *= old_dim;
        }

        let mut elems = Vec::with_capacity(volume(shape));
        for_each_index(shape, |index| {
            let offset: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
            elems.push(self.elems[offset].clone());
        });
        Ok(Self {
            shape: shape.to_vec(),
            elems,
        })
    }

    /// Permute axes: axis `i` of `self` becomes axis `perm[i]`.
    pub fn permute(&self, perm: &[usize]) -> Result<Self> {
        if perm.len() != self.order() {
            return Err(Error::arity(self.order(), perm.len()));
        }
        let mut shape = vec![usize::MAX; perm.len()];
        for (&p, &d) in perm.iter().zip(&self.shape) {
            match shape.get_mut(p) {
                Some(slot) if *slot == usize::MAX => *slot = d,
                _ => {
                    return Err(Error::Invalid {
                        kind: "axis permutation",
                        reason: format!("{:?} is not a permutation of 0..{}", perm, perm.len()),
                    })
                }
            }
        }
        self.reshape(&shape, perm)
    }

    /// Stack equal-shaped tensors along a new trailing axis.
    pub fn concat(parts: &[Self]) -> Result<Self> {
        match parts.first() {
            Some(first) => Self::concat_with_shape(&first.shape, parts),
            None => Err(Error::arity(1, 0)),
        }
    }

    /// Like [`Tensor::concat`], with the part shape given explicitly so an
    /// empty list yields a tensor whose trailing axis has size zero.
    pub fn concat_with_shape(shape: &[usize], parts: &[Self]) -> Result<Self> {
        let mut elems = Vec::with_capacity(volume(shape) * parts.len());
        for part in parts {
            if part.shape != shape {
                return Err(Error::shape(shape, &part.shape));
            }
            elems.extend(part.elems.iter().cloned());
        }
        let mut shape = shape.to_vec();
        shape.push(parts.len());
        Ok(Self { shape, elems })
    }

    /// Split along the last axis; inverse of [`Tensor::concat`].
    pub fn unconcat(&self) -> Result<Vec<Self>> {
        let Some((&count, shape)) = self.shape.split_last() else {
            return Err(Error::arity(1, 0));
        };
        let block = volume(shape);
        Ok((0..count)
            .map(|c| Self {
                shape: shape.to_vec(),
                elems: self.elems[c * block..(c + 1) * block].to_vec(),
            })
            .collect())
    }
}

impl Tensor<bool> {
    /// Number of true cells
    pub fn count(&self) -> usize {
        self.elems.iter().filter(|&&b| b).count()
    }

    /// Indices of the true cells, in storage order
    pub fn tuples(&self) -> Vec<Vec<usize>> {
        IndexIter::new(&self.shape)
            .zip(&self.elems)
            .filter(|(_, b)| **b)
            .map(|(index, _)| index)
            .collect()
    }
}

// ============================================================================
// INDEX ITERATION
// ============================================================================

/// Number of cells of a shape
pub fn volume(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Call `f` on every index of `shape`, first axis fastest.
fn for_each_index<F: FnMut(&[usize])>(shape: &[usize], mut f: F) {
    if shape.contains(&0) {
        return;
    }
    let mut index = vec![0; shape.len()];
    loop {
        f(&index);
        let mut axis = 0;
        loop {
            if axis == shape.len() {
                return;
            }
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
            axis += 1;
        }
    }
}

/// Iterator over all indices of a shape, first axis fastest
#[derive(Clone, Debug)]
pub struct IndexIter {
    shape: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl IndexIter {
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            current: vec![0; shape.len()],
            done: shape.contains(&0),
        }
    }
}

impl Iterator for IndexIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.current.clone();

        // Advance, first axis fastest
        self.done = true;
        for (i, &d) in self.current.iter_mut().zip(&self.shape) {
            *i += 1;
            if *i < d {
                self.done = false;
                break;
            }
            *i = 0;
        }
        Some(result)
    }
}
