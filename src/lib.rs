#![doc = include_str!("../README.md")]
//! ## Tensors
//!
//! - [`Tensor`] is a dense, row-major array of one [`Element`] type
//! - [`DynTensor`] holds a tensor whose element type is only known at run time
//!
//! ## Operate .npy Files
//!
//! - Reading: [`Tensor::load`], [`Tensor::read_npy`], [`read_npy`]
//! - Writing: [`Tensor::save`], [`Tensor::write_npy`], [`write_npy`]
//! - Headers only: [`peek`], [`peek_npy`]
//!
//! ## Operate .npz Files
//!
//! - Reading: [`NpzReader`]
//! - Writing: [`NpzWriter`]
//!
//! ## Errors
//!
//! Every error type has a `kind` method sorting it into one of the
//! [`ErrorKind`] categories.
//!
//! ## Limitations
//!
//! - Parsing of `.npy` files is currently limited to files where the `descr`
//!   field of the [header dictionary] is a Python string literal of the form
//!   `'string'`, `"string"`, `'''string'''`, or `"""string"""`.
//!
//! - [`Element`] is implemented only for the fixed-size integers up to 64
//!   bits, `f32`, `f64` and `String`.
//!
//! [header dictionary]: https://docs.scipy.org/doc/numpy/reference/generated/numpy.lib.format.html#format-version-1-0
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs)]

mod dtype;
mod layout;
mod npy;
mod npz;
mod path;
mod tensor;

#[cfg(feature = "ndarray")]
mod impl_ndarray;

pub use crate::{
    dtype::{DataType, Endian},
    npy::{
        peek, peek_npy, read_npy, write_npy, Element, FormatHeaderError, HeaderInfo,
        ParseHeaderError, ReadDataError, ReadNpyError, TypeDescriptor, WriteDataError,
        WriteNpyError,
    },
    npz::{
        CompressionMethod, NpzEntry, NpzOptions, NpzReader, NpzWriter, ReadNpzError,
        WriteNpzError,
    },
    tensor::{DynTensor, Shape, Tensor, TensorError},
};

/// Category of a failure, shared by every error type in this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller supplied something unusable: a missing path, a wrong
    /// index arity, a buffer of the wrong length, an unknown compression
    /// method, an absent archive member or the wrong element type.
    Validation,
    /// An index with the right arity lies outside its dimension.
    OutOfBounds,
    /// Corrupt or unexpected bytes, use of a closed stream, or an I/O
    /// failure.
    Format,
}
