//! One module per scheme core (spec 4.4-4.7), dispatched to by
//! `facade`. BBS04/KLAP20/GL19/DL21/DL21-SEQ share `credential`/`join`'s
//! BBS+-style engine and differ only in what they add to the Sign-time SPK
//! conjunction and to the signature's aux fields; PS16 builds its own
//! credential and Join directly atop `schnorr_pok` (see `ps16`'s module
//! docs).

pub mod bbs04;
pub mod dl21;
pub mod dl21seq;
pub mod gl19;
pub mod klap20;
pub mod ps16;
mod support;
