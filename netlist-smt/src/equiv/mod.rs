// SPDX-License-Identifier: Apache-2.0

pub mod easy_smt_backend;
pub mod prove_equiv;
pub mod solver_interface;
pub mod varisat_backend;
