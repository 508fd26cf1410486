
mod format_csv_test;
mod odbc_test;
mod output_test;
mod project_test;
