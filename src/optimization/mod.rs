pub mod adam;
pub mod gradient_descent;
pub mod gradient_descent_with_momentum;
pub mod optimizer;

use serde_json::Value;

use crate::error::{Result, TrainErr};

pub use adam::Adam;
pub use gradient_descent::GradientDescent;
pub use gradient_descent_with_momentum::GradientDescentWithMomentum;
pub use optimizer::Optimizer;

/// Resolves an optimizer descriptor against the registry of known
/// update rules and constructs it over `num_params` parameters.
///
/// The namespace is closed; hyperparameters are read from `args` with
/// the usual defaults when absent.
///
/// # Errors
/// Returns `UnknownOptimizer` for names outside the registry.
pub fn resolve_optimizer(name: &str, args: &Value, num_params: usize) -> Result<Box<dyn Optimizer>> {
    let lr = args["lr"].as_f64().unwrap_or(0.01) as f32;

    match name {
        "gradient_descent" => Ok(Box::new(GradientDescent::new(lr))),
        "gradient_descent_with_momentum" => {
            let mu = args["mu"].as_f64().unwrap_or(0.9) as f32;
            Ok(Box::new(GradientDescentWithMomentum::new(
                num_params, lr, mu,
            )))
        }
        "adam" => {
            let b1 = args["b1"].as_f64().unwrap_or(0.9) as f32;
            let b2 = args["b2"].as_f64().unwrap_or(0.999) as f32;
            let eps = args["eps"].as_f64().unwrap_or(1e-8) as f32;
            Ok(Box::new(Adam::new(num_params, lr, b1, b2, eps)))
        }
        other => Err(TrainErr::UnknownOptimizer {
            name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn registry_resolves_every_known_name() {
        for name in [
            "gradient_descent",
            "gradient_descent_with_momentum",
            "adam",
        ] {
            assert!(resolve_optimizer(name, &json!({}), 4).is_ok(), "{name}");
        }
    }

    #[test]
    fn registry_rejects_unknown_names() {
        let err = resolve_optimizer("rmsprop", &json!({}), 4).err().unwrap();
        assert!(matches!(
            err,
            TrainErr::UnknownOptimizer { name } if name == "rmsprop"
        ));
    }

    #[test]
    fn descriptor_args_reach_the_update_rule() {
        let mut opt = resolve_optimizer("gradient_descent", &json!({ "lr": 1.0 }), 1).unwrap();
        let mut params = vec![0.0];
        opt.update_params(&[2.0], &mut params).unwrap();
        assert_eq!(params, vec![-2.0]);
    }
}
