// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Concrete [`OutlineRasterizer`](crate::OutlineRasterizer) implementations.

#[cfg(feature = "skrifa")]
#[cfg_attr(docsrs, doc(cfg(feature = "skrifa")))]
pub mod skrifa;
