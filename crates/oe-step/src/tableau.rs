//! Butcher tableaux and their validation.

use crate::error::{StepError, StepResult};

/// Coefficients of a Runge-Kutta method.
///
/// `alphas` are the stage time offsets, `betas` the stage coupling matrix
/// (row-major) and `gammas` the final combination weights.
#[derive(Clone, Debug, PartialEq)]
pub struct ButcherTableau {
    pub alphas: Vec<f64>,
    pub betas: Vec<Vec<f64>>,
    pub gammas: Vec<f64>,
}

impl ButcherTableau {
    pub fn new(alphas: Vec<f64>, betas: Vec<Vec<f64>>, gammas: Vec<f64>) -> Self {
        Self {
            alphas,
            betas,
            gammas,
        }
    }

    pub fn num_stages(&self) -> usize {
        self.alphas.len()
    }

    /// Structural problems shared by explicit and implicit tableaux.
    fn shape_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let stages = self.alphas.len();

        if stages == 0 {
            violations.push("a tableau needs at least one stage".to_string());
        }
        if self.alphas.len() != self.gammas.len() {
            violations.push(format!(
                "alpha and gamma vectors are not the same length ({} vs {})",
                self.alphas.len(),
                self.gammas.len()
            ));
        }
        if self.betas.len() != stages || self.betas.iter().any(|row| row.len() != stages) {
            violations.push(
                "betas must be a square matrix with the same dimension as the alphas/gammas arrays"
                    .to_string(),
            );
        }
        let finite = self
            .alphas
            .iter()
            .chain(self.gammas.iter())
            .chain(self.betas.iter().flatten())
            .all(|c| c.is_finite());
        if !finite {
            violations.push("all coefficients must be finite".to_string());
        }
        violations
    }

    /// True when every entry on or above the diagonal is zero.
    pub fn is_strictly_lower_triangular(&self) -> bool {
        self.betas
            .iter()
            .enumerate()
            .all(|(i, row)| row.iter().skip(i).all(|b| *b == 0.0))
    }

    /// Check the tableau describes an explicit method.
    pub fn validate_explicit(&self) -> StepResult<()> {
        let mut violations = self.shape_violations();
        if !self.is_strictly_lower_triangular() {
            violations.push(
                "the beta matrix has to be strictly lower triangular for an explicit \
                 Runge-Kutta method, i.e. b_ij = 0 for i <= j"
                    .to_string(),
            );
        }
        into_result(violations)
    }

    /// Check the tableau describes a (multi-stage) implicit method.
    pub fn validate_implicit(&self) -> StepResult<()> {
        let mut violations = self.shape_violations();
        if self.betas.len() == 1 {
            violations.push(
                "single-stage implicit Runge-Kutta tableau supplied; use BackwardEuler instead"
                    .to_string(),
            );
        }
        into_result(violations)
    }

    pub fn forward_euler() -> Self {
        Self::new(vec![0.0], vec![vec![0.0]], vec![1.0])
    }

    pub fn midpoint() -> Self {
        Self::new(
            vec![0.0, 0.5],
            vec![vec![0.0, 0.0], vec![0.5, 0.0]],
            vec![0.0, 1.0],
        )
    }

    pub fn heun() -> Self {
        Self::new(
            vec![0.0, 1.0],
            vec![vec![0.0, 0.0], vec![1.0, 0.0]],
            vec![0.5, 0.5],
        )
    }

    pub fn kutta3() -> Self {
        Self::new(
            vec![0.0, 0.5, 1.0],
            vec![
                vec![0.0, 0.0, 0.0],
                vec![0.5, 0.0, 0.0],
                vec![-1.0, 2.0, 0.0],
            ],
            vec![1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
        )
    }

    /// Classical fourth order Runge-Kutta.
    pub fn rk4() -> Self {
        Self::new(
            vec![0.0, 0.5, 0.5, 1.0],
            vec![
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.5, 0.0, 0.0, 0.0],
                vec![0.0, 0.5, 0.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0],
            ],
            vec![1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
        )
    }

    pub fn three_eighths() -> Self {
        Self::new(
            vec![0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0],
            vec![
                vec![0.0, 0.0, 0.0, 0.0],
                vec![1.0 / 3.0, 0.0, 0.0, 0.0],
                vec![-1.0 / 3.0, 1.0, 0.0, 0.0],
                vec![1.0, -1.0, 1.0, 0.0],
            ],
            vec![0.125, 0.375, 0.375, 0.125],
        )
    }

    /// Two-stage Gauss-Legendre, order 4.
    pub fn gauss_legendre4() -> Self {
        let s = 3.0_f64.sqrt() / 6.0;
        Self::new(
            vec![0.5 - s, 0.5 + s],
            vec![vec![0.25, 0.25 - s], vec![0.25 + s, 0.25]],
            vec![0.5, 0.5],
        )
    }

    /// Two-stage Radau IIA, order 3.
    pub fn radau_iia3() -> Self {
        Self::new(
            vec![1.0 / 3.0, 1.0],
            vec![vec![5.0 / 12.0, -1.0 / 12.0], vec![0.75, 0.25]],
            vec![0.75, 0.25],
        )
    }

    /// Two-stage Lobatto IIIC, order 2.
    pub fn lobatto_iiic2() -> Self {
        Self::new(
            vec![0.0, 1.0],
            vec![vec![0.5, -0.5], vec![0.5, 0.5]],
            vec![0.5, 0.5],
        )
    }
}

/// Explicit tableau with a second set of weights for an embedded estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedTableau {
    pub tableau: ButcherTableau,
    pub estimate_gammas: Vec<f64>,
}

impl EmbeddedTableau {
    pub fn validate(&self) -> StepResult<()> {
        let mut violations = match self.tableau.validate_explicit() {
            Ok(()) => Vec::new(),
            Err(StepError::InvalidTableau { violations }) => violations,
            Err(other) => return Err(other),
        };
        if self.estimate_gammas.len() != self.tableau.num_stages() {
            violations.push(format!(
                "estimate weights must have one entry per stage ({} vs {})",
                self.estimate_gammas.len(),
                self.tableau.num_stages()
            ));
        }
        into_result(violations)
    }

    /// Heun 2 with an Euler estimate.
    pub fn heun_euler() -> Self {
        Self {
            tableau: ButcherTableau::heun(),
            estimate_gammas: vec![1.0, 0.0],
        }
    }

    /// Bogacki-Shampine 3(2).
    pub fn bogacki_shampine() -> Self {
        Self {
            tableau: ButcherTableau::new(
                vec![0.0, 0.5, 0.75, 1.0],
                vec![
                    vec![0.0, 0.0, 0.0, 0.0],
                    vec![0.5, 0.0, 0.0, 0.0],
                    vec![0.0, 0.75, 0.0, 0.0],
                    vec![2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0, 0.0],
                ],
                vec![2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0, 0.0],
            ),
            estimate_gammas: vec![7.0 / 24.0, 0.25, 1.0 / 3.0, 0.125],
        }
    }

    /// Runge-Kutta-Fehlberg propagating the fifth order solution.
    pub fn fehlberg45() -> Self {
        Self {
            tableau: ButcherTableau::new(
                vec![0.0, 0.25, 0.375, 12.0 / 13.0, 1.0, 0.5],
                vec![
                    vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![0.25, 0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0, 0.0],
                    vec![1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0, 0.0],
                    vec![439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0, 0.0],
                    vec![
                        -8.0 / 27.0,
                        2.0,
                        -3544.0 / 2565.0,
                        1859.0 / 4104.0,
                        -11.0 / 40.0,
                        0.0,
                    ],
                ],
                vec![
                    16.0 / 135.0,
                    0.0,
                    6656.0 / 12825.0,
                    28561.0 / 56430.0,
                    -9.0 / 50.0,
                    2.0 / 55.0,
                ],
            ),
            estimate_gammas: vec![
                25.0 / 216.0,
                0.0,
                1408.0 / 2565.0,
                2197.0 / 4104.0,
                -0.2,
                0.0,
            ],
        }
    }

    /// Dormand-Prince 5(4).
    pub fn dormand_prince() -> Self {
        let b5 = vec![
            35.0 / 384.0,
            0.0,
            500.0 / 1113.0,
            125.0 / 192.0,
            -2187.0 / 6784.0,
            11.0 / 84.0,
            0.0,
        ];
        let mut last_row = b5.clone();
        last_row[6] = 0.0;
        Self {
            tableau: ButcherTableau::new(
                vec![0.0, 0.2, 0.3, 0.8, 8.0 / 9.0, 1.0, 1.0],
                vec![
                    vec![0.0; 7],
                    vec![0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0, 0.0],
                    vec![
                        19372.0 / 6561.0,
                        -25360.0 / 2187.0,
                        64448.0 / 6561.0,
                        -212.0 / 729.0,
                        0.0,
                        0.0,
                        0.0,
                    ],
                    vec![
                        9017.0 / 3168.0,
                        -355.0 / 33.0,
                        46732.0 / 5247.0,
                        49.0 / 176.0,
                        -5103.0 / 18656.0,
                        0.0,
                        0.0,
                    ],
                    last_row,
                ],
                b5,
            ),
            estimate_gammas: vec![
                5179.0 / 57600.0,
                0.0,
                7571.0 / 16695.0,
                393.0 / 640.0,
                -92097.0 / 339200.0,
                187.0 / 2100.0,
                1.0 / 40.0,
            ],
        }
    }
}

fn into_result(violations: Vec<String>) -> StepResult<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(StepError::InvalidTableau { violations })
    }
}
