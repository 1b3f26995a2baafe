// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Extra asserts to make tests shorter / more readable.

#[macro_export]
macro_rules! assert_output {
  ($dir:expr, [$($path:literal),* $(,)?]) => {{
    let actual = $dir.output_files();
    let expected = std::collections::HashSet::from([$(std::path::PathBuf::from($path)),*]);

    assert!(
      actual == expected,
      "Output directory contents do not match:\nActual:   {actual:#?}\nExpected: {expected:#?}"
    );
  }}
}

#[macro_export]
macro_rules! assert_err {
  ($res:expr, $msg:literal) => {{
    let Err(e) = $res else {
      panic!("Unexpected `Ok`.");
    };
    let message = e.to_string();

    assert!(
      message.contains($msg),
      "Error message did not contain expected substring.\nActual:\n{message}\nExpected:\n{}",
      $msg
    );
  }};
}
