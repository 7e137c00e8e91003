use ndarray::{array, Array2, Array3, ArrayD, Ix2, IxDyn, ShapeBuilder};
use npy_archive::{Endian, Tensor};

#[test]
fn standard_layout_array() {
    let arr = array![[1i32, 2, 3], [4, 5, 6]];
    let tensor = Tensor::from_ndarray(&arr);
    assert_eq!(tensor.shape().dims(), &[2, 3]);
    assert!(!tensor.fortran_order());
    assert_eq!(tensor.values(), &[1, 2, 3, 4, 5, 6]);
    assert_eq!(tensor.into_ndarray::<Ix2>().unwrap(), arr);
}

#[test]
fn column_major_array_keeps_fortran_order() {
    let arr = Array3::from_shape_fn((2, 3, 4).f(), |(i, j, k)| (i * 100 + j * 10 + k) as u16);
    let tensor = Tensor::from(&arr);
    assert!(tensor.fortran_order());
    assert_eq!(tensor.get(&[1, 2, 3]), Ok(&123));

    let bytes = tensor.to_npy_bytes(Endian::Big).unwrap();
    let back = Tensor::<u16>::read_npy(&bytes[..]).unwrap();
    assert!(back.fortran_order());
    assert_eq!(back.into_ndarray::<IxDyn>().unwrap(), arr.into_dyn());
}

#[test]
fn sliced_array_is_copied_in_logical_order() {
    let arr = Array2::from_shape_fn((4, 4), |(i, j)| (i * 4 + j) as f64);
    let view = arr.slice(ndarray::s![..;2, 1..3]);
    let tensor = Tensor::from_ndarray(&view);
    assert!(!tensor.fortran_order());
    assert_eq!(tensor.values(), &[1.0, 2.0, 9.0, 10.0]);
}

#[test]
fn rank_mismatch_is_reported() {
    let tensor = Tensor::<u8>::zeros([2, 2, 2]);
    assert!(tensor.clone().into_ndarray::<Ix2>().is_err());
    let dynamic: ArrayD<u8> = tensor.into_ndarray::<IxDyn>().unwrap();
    assert_eq!(dynamic.shape(), &[2, 2, 2]);
}
