macro_rules! assert_ts_eq {
    ($lhs:expr, $rhs:expr) => {{
        let lhs: proc_macro2::TokenStream = $lhs;
        let rhs: proc_macro2::TokenStream = $rhs;
        if lhs.to_string() != rhs.to_string() {
            panic!(
                r#"assertion failed: `(left == right)`
left:
```
{}
```

right: ```
{}
```
"#,
                lhs, rhs,
            );
        }
    }};
    ($lhs:expr, $rhs:expr,) => {
        assert_ts_eq!($lhs, $rhs)
    };
}
