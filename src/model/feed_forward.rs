use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde_json::Value;

use super::PredictiveModel;
use crate::error::{Result, TrainErr};

/// One dense layer over a slice of the model's flat parameter buffer.
///
/// Parameters are laid out `[w, b]`: `dim.0 * dim.1` weights in
/// row-major order followed by `dim.1` biases. Forward state is cached
/// for the backward pass.
#[derive(Debug, Clone)]
struct DenseLayer {
    dim: (usize, usize),
    sigmoid: bool,

    x: Array2<f32>,
    a: Array2<f32>,
}

impl DenseLayer {
    fn new(dim: (usize, usize), sigmoid: bool) -> Self {
        let empty = Array2::zeros((0, 0));
        Self {
            dim,
            sigmoid,
            x: empty.clone(),
            a: empty,
        }
    }

    #[inline]
    fn size(&self) -> usize {
        (self.dim.0 + 1) * self.dim.1
    }

    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Array2<f32> {
        let (w, b) = self.view_params(params);

        let mut z = x.dot(&w);
        z += &b;
        self.x = x.to_owned();

        if self.sigmoid {
            let a = z.mapv(|z| 1.0 / (1.0 + (-z).exp()));
            self.a = a.clone();
            a
        } else {
            z
        }
    }

    /// Consumes `d`, the loss gradient at this layer's output, writes
    /// the parameter gradient into `grad`, and returns the loss
    /// gradient at the layer's input.
    fn backward(&mut self, params: &[f32], grad: &mut [f32], mut d: Array2<f32>) -> Array2<f32> {
        if self.sigmoid {
            d.zip_mut_with(&self.a, |d, &a| *d *= a * (1.0 - a));
        }

        let (mut dw, mut db) = self.view_grad(grad);
        dw.assign(&self.x.t().dot(&d));
        db.assign(&d.sum_axis(Axis(0)));

        let (w, _) = self.view_params(params);
        d.dot(&w.t())
    }

    fn view_params<'a>(&self, params: &'a [f32]) -> (ArrayView2<'a, f32>, ArrayView1<'a, f32>) {
        let w_size = self.dim.0 * self.dim.1;
        let weights = ArrayView2::from_shape(self.dim, &params[..w_size]).unwrap();
        let biases = ArrayView1::from_shape(self.dim.1, &params[w_size..]).unwrap();
        (weights, biases)
    }

    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> (ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>) {
        let w_size = self.dim.0 * self.dim.1;
        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw).unwrap();
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw).unwrap();
        (dw, db)
    }
}

/// A dense stack with sigmoid hidden activations and a linear output
/// layer, over one flat parameter buffer.
pub struct FeedForward {
    input_names: Vec<String>,
    output_names: Vec<String>,
    layers: Vec<DenseLayer>,
    params: Vec<f32>,
}

impl FeedForward {
    /// Builds the architecture from its resolved `model.args` mapping:
    /// `input_size`, `output_size`, `input_names`, `output_names`, and
    /// an optional `hidden` list of layer widths. Weights are drawn
    /// Xavier-uniform from `rng`, biases start at zero.
    ///
    /// # Errors
    /// Returns `MissingKey` for absent required args, `SizeMismatch`
    /// when a name list disagrees with its declared size, and
    /// `InvalidConfig` for malformed values.
    pub fn from_args<R: Rng>(args: &Value, rng: &mut R) -> Result<Self> {
        let input_size = require_size(args, "input_size", "model.args.input_size")?;
        let output_size = require_size(args, "output_size", "model.args.output_size")?;
        let input_names = string_list(args, "input_names", "model.args.input_names")?;
        let output_names = string_list(args, "output_names", "model.args.output_names")?;

        check_width("input_names", &input_names, input_size)?;
        check_width("output_names", &output_names, output_size)?;

        let hidden = hidden_sizes(args)?;

        let mut dims = Vec::with_capacity(hidden.len() + 2);
        dims.push(input_size);
        dims.extend(hidden);
        dims.push(output_size);

        let layers: Vec<DenseLayer> = dims
            .windows(2)
            .enumerate()
            .map(|(i, pair)| DenseLayer::new((pair[0], pair[1]), i + 2 < dims.len()))
            .collect();

        let params = init_params(&layers, rng)?;

        Ok(Self {
            input_names,
            output_names,
            layers,
            params,
        })
    }
}

impl PredictiveModel for FeedForward {
    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn num_params(&self) -> usize {
        self.params.len()
    }

    fn params(&self) -> &[f32] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [f32] {
        &mut self.params
    }

    fn forward(&mut self, x: ArrayView2<f32>) -> Array2<f32> {
        let mut h = x.to_owned();
        let mut offset = 0;

        for layer in &mut self.layers {
            let size = layer.size();
            h = layer.forward(&self.params[offset..offset + size], h.view());
            offset += size;
        }

        h
    }

    fn backward(&mut self, d_out: ArrayView2<f32>, grad: &mut [f32]) {
        let mut d = d_out.to_owned();
        let mut offset = self.params.len();

        for layer in self.layers.iter_mut().rev() {
            let size = layer.size();
            offset -= size;
            d = layer.backward(
                &self.params[offset..offset + size],
                &mut grad[offset..offset + size],
                d,
            );
        }
    }
}

fn init_params<R: Rng>(layers: &[DenseLayer], rng: &mut R) -> Result<Vec<f32>> {
    let total = layers.iter().map(DenseLayer::size).sum();
    let mut params = vec![0.0; total];
    let mut offset = 0;

    for layer in layers {
        let (fan_in, fan_out) = layer.dim;
        let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
        let dist = Uniform::new(-limit, limit)
            .map_err(|e| TrainErr::InvalidConfig(format!("weight init: {e}")))?;

        let w_size = fan_in * fan_out;
        for w in &mut params[offset..offset + w_size] {
            *w = dist.sample(rng);
        }
        // Biases stay zero.
        offset += layer.size();
    }

    Ok(params)
}

fn require_size(args: &Value, field: &str, key: &'static str) -> Result<usize> {
    let size = args
        .get(field)
        .and_then(Value::as_u64)
        .ok_or(TrainErr::MissingKey { key })? as usize;

    if size == 0 {
        return Err(TrainErr::InvalidConfig(format!("{key} must be > 0")));
    }
    Ok(size)
}

fn string_list(args: &Value, field: &str, key: &'static str) -> Result<Vec<String>> {
    args.get(field)
        .and_then(Value::as_array)
        .ok_or(TrainErr::MissingKey { key })?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| TrainErr::InvalidConfig(format!("{key} must contain strings")))
        })
        .collect()
}

fn check_width(what: &'static str, names: &[String], size: usize) -> Result<()> {
    if names.len() != size {
        return Err(TrainErr::SizeMismatch {
            what,
            got: names.len(),
            expected: size,
        });
    }
    Ok(())
}

fn hidden_sizes(args: &Value) -> Result<Vec<usize>> {
    match args.get("hidden") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_u64().map(|n| n as usize).filter(|&n| n > 0).ok_or_else(|| {
                    TrainErr::InvalidConfig(
                        "model.args.hidden must contain positive integers".into(),
                    )
                })
            })
            .collect(),
        Some(_) => Err(TrainErr::InvalidConfig(
            "model.args.hidden must be a list".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    use super::*;

    fn args(hidden: Value) -> Value {
        json!({
            "input_size": 2,
            "output_size": 1,
            "input_names": ["pitch", "duration"],
            "output_names": ["velocity"],
            "hidden": hidden,
        })
    }

    #[test]
    fn parameter_count_covers_weights_and_biases() {
        let mut rng = StdRng::seed_from_u64(0);
        let model = FeedForward::from_args(&args(json!([4])), &mut rng).unwrap();
        // (2 + 1) * 4 + (4 + 1) * 1
        assert_eq!(model.num_params(), 17);
        assert_eq!(model.input_names(), ["pitch", "duration"]);
        assert_eq!(model.output_names(), ["velocity"]);
    }

    #[test]
    fn linear_forward_matches_by_hand() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut model = FeedForward::from_args(&args(Value::Null), &mut rng).unwrap();
        model.params_mut().copy_from_slice(&[1.0, 1.0, 0.5]);

        let y = model.forward(arr2(&[[1.0, 2.0]]).view());
        assert_eq!(y[[0, 0]], 3.5);
    }

    #[test]
    fn linear_backward_matches_by_hand() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut model = FeedForward::from_args(&args(Value::Null), &mut rng).unwrap();
        model.params_mut().copy_from_slice(&[1.0, 1.0, 0.5]);

        let mut grad = vec![0.0; model.num_params()];
        model.forward(arr2(&[[1.0, 2.0]]).view());
        model.backward(arr2(&[[7.0]]).view(), &mut grad);

        // dw = x^T * d, db = sum(d)
        assert_eq!(grad, vec![7.0, 14.0, 7.0]);
    }

    #[test]
    fn missing_args_are_reported_by_key() {
        let mut rng = StdRng::seed_from_u64(0);
        let incomplete = json!({ "input_size": 2 });
        let err = FeedForward::from_args(&incomplete, &mut rng).err().unwrap();
        assert!(matches!(
            err,
            TrainErr::MissingKey {
                key: "model.args.output_size",
            }
        ));
    }

    #[test]
    fn name_width_mismatch_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut bad = args(Value::Null);
        bad["input_names"] = json!(["pitch"]);
        let err = FeedForward::from_args(&bad, &mut rng).err().unwrap();
        assert!(matches!(err, TrainErr::SizeMismatch { what: "input_names", .. }));
    }
}
