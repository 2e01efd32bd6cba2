use rulinalg::matrix::{BaseMatrix, Matrix};
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

/// On-disk shape of a weight matrix: dimensions plus row-major data
#[derive(Serialize, Deserialize)]
struct MatrixRepr {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

pub fn serialize_matrix<S: Serializer>(
    matrix: &Matrix<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    MatrixRepr {
        rows: matrix.rows(),
        cols: matrix.cols(),
        data: matrix.data().to_vec(),
    }
    .serialize(serializer)
}

pub fn deserialize_matrix<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Matrix<f64>, D::Error> {
    let MatrixRepr { rows, cols, data } = MatrixRepr::deserialize(deserializer)?;
    if rows * cols != data.len() {
        return Err(D::Error::custom(format!(
            "{rows}x{cols} matrix carries {} values",
            data.len()
        )));
    }
    Ok(Matrix::new(rows, cols, data))
}
