pub mod pdf_download_tool;
