pub mod drive_fetch;
pub mod drive_pdf;
pub mod drive_url;
pub mod pdf;

#[cfg(test)]
pub(crate) mod test_support;
