use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// All instances belonging to one source piece.
///
/// Inputs and targets are stored as flat row-major buffers; the widths
/// live on the owning [`GroupedDataset`]. Every instance in a group
/// shares provenance, so splits assign whole groups, never rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    name: String,
    xs: Vec<f32>,
    ys: Vec<f32>,
}

impl Group {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An ordered collection of groups with fixed instance widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedDataset {
    x_size: usize,
    y_size: usize,
    groups: Vec<Group>,
}

impl GroupedDataset {
    /// Creates an empty dataset with the given instance widths.
    ///
    /// # Panics
    /// - if `x_size` or `y_size` is zero
    pub fn new(x_size: usize, y_size: usize) -> Self {
        assert!(x_size > 0, "x_size must be > 0");
        assert!(y_size > 0, "y_size must be > 0");
        Self {
            x_size,
            y_size,
            groups: Vec::new(),
        }
    }

    /// Appends a group from owned flat buffers.
    ///
    /// # Panics
    /// - if the buffers are not whole multiples of the instance widths
    /// - if the buffers describe different instance counts
    pub fn push_group(&mut self, name: impl Into<String>, xs: Vec<f32>, ys: Vec<f32>) {
        assert_eq!(xs.len() % self.x_size, 0, "xs must be rows of x_size");
        assert_eq!(ys.len() % self.y_size, 0, "ys must be rows of y_size");
        assert_eq!(
            xs.len() / self.x_size,
            ys.len() / self.y_size,
            "xs and ys must describe the same instances"
        );

        self.groups.push(Group {
            name: name.into(),
            xs,
            ys,
        });
    }

    #[inline]
    pub fn x_size(&self) -> usize {
        self.x_size
    }

    #[inline]
    pub fn y_size(&self) -> usize {
        self.y_size
    }

    #[inline]
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of instances in the group at `idx` (panics if out of bounds).
    #[inline]
    pub fn group_len(&self, idx: usize) -> usize {
        self.groups[idx].xs.len() / self.x_size
    }

    /// Total instance count over all groups.
    pub fn num_instances(&self) -> usize {
        self.groups.iter().map(|g| g.xs.len() / self.x_size).sum()
    }

    #[inline]
    pub fn group(&self, idx: usize) -> &Group {
        &self.groups[idx]
    }

    /// Input rows of the group at `idx` as a 2-d view.
    pub fn group_xs(&self, idx: usize) -> ArrayView2<'_, f32> {
        let g = &self.groups[idx];
        ArrayView2::from_shape((g.xs.len() / self.x_size, self.x_size), &g.xs).unwrap()
    }

    /// Target rows of the group at `idx` as a 2-d view.
    pub fn group_ys(&self, idx: usize) -> ArrayView2<'_, f32> {
        let g = &self.groups[idx];
        ArrayView2::from_shape((g.ys.len() / self.y_size, self.y_size), &g.ys).unwrap()
    }

    /// Concatenates the selected groups into flat instance matrices,
    /// preserving the order of `indices` and the row order inside each
    /// group.
    ///
    /// # Panics
    /// - if any index is out of bounds
    pub fn flatten(&self, indices: &[usize]) -> (Array2<f32>, Array2<f32>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut rows = 0;

        for &idx in indices {
            let g = &self.groups[idx];
            xs.extend_from_slice(&g.xs);
            ys.extend_from_slice(&g.ys);
            rows += g.xs.len() / self.x_size;
        }

        (
            Array2::from_shape_vec((rows, self.x_size), xs).unwrap(),
            Array2::from_shape_vec((rows, self.y_size), ys).unwrap(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> GroupedDataset {
        let mut ds = GroupedDataset::new(2, 1);
        ds.push_group("a", vec![0.0, 1.0, 2.0, 3.0], vec![10.0, 11.0]);
        ds.push_group("b", vec![4.0, 5.0], vec![12.0]);
        ds
    }

    #[test]
    fn dataset_counts_and_views() {
        let ds = dataset();
        assert_eq!(ds.num_groups(), 2);
        assert_eq!(ds.num_instances(), 3);
        assert_eq!(ds.group_len(0), 2);
        assert_eq!(ds.group(1).name(), "b");
        assert_eq!(ds.group_xs(1).shape(), &[1, 2]);
        assert_eq!(ds.group_ys(0)[[1, 0]], 11.0);
    }

    #[test]
    fn flatten_preserves_index_order() {
        let ds = dataset();
        let (xs, ys) = ds.flatten(&[1, 0]);
        assert_eq!(xs.shape(), &[3, 2]);
        assert_eq!(xs[[0, 0]], 4.0);
        assert_eq!(xs[[1, 0]], 0.0);
        assert_eq!(ys[[0, 0]], 12.0);
    }

    #[test]
    #[should_panic(expected = "same instances")]
    fn push_group_rejects_mismatched_rows() {
        let mut ds = GroupedDataset::new(2, 1);
        ds.push_group("a", vec![0.0, 1.0], vec![10.0, 11.0]);
    }
}
