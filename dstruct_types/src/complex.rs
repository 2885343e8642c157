/* Complex number values */

use crate::dtypes::DataType;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/* A real/imaginary pair. Use the `Complex64`/`Complex128` aliases */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

pub type Complex64 = Complex<f32>;
pub type Complex128 = Complex<f64>;

impl<T> Complex<T> {
    pub const fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

impl Complex64 {
    pub fn dtype(&self) -> DataType {
        DataType::Complex64
    }

    pub fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }

    pub fn widen(self) -> Complex128 {
        Complex128::new(self.re as f64, self.im as f64)
    }
}

impl Complex128 {
    pub fn dtype(&self) -> DataType {
        DataType::Complex128
    }

    pub fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }

    pub fn narrow(self) -> Complex64 {
        Complex64::new(self.re as f32, self.im as f32)
    }
}

impl From<Complex64> for Complex128 {
    fn from(value: Complex64) -> Self {
        value.widen()
    }
}

/* Compact structural form, e.g. {"type":"Complex128","re":1.0,"im":-2.0} */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type")]
pub enum ComplexJson {
    Complex64 { re: f32, im: f32 },
    Complex128 { re: f64, im: f64 },
}

impl From<Complex64> for ComplexJson {
    fn from(value: Complex64) -> Self {
        ComplexJson::Complex64 {
            re: value.re,
            im: value.im,
        }
    }
}

impl From<Complex128> for ComplexJson {
    fn from(value: Complex128) -> Self {
        ComplexJson::Complex128 {
            re: value.re,
            im: value.im,
        }
    }
}

impl<T: fmt::Display + PartialOrd + Default + Copy + std::ops::Neg<Output = T>> fmt::Display
    for Complex<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im < T::default() {
            write!(f, "{} - {}i", self.re, -self.im)
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}
