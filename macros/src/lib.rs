//! Augment the development of governance primitives with procedural macros.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, AttributeArgs, ItemFn, Lit, Meta, NestedMeta};

/// Run a test function with a [tracing] subscriber that captures output.
///
/// The subscriber writes through the test harness (so output is only shown for failing
/// tests) and defaults to the `DEBUG` level. A different level can be selected with
/// `#[test_traced(level = "INFO")]`.
///
/// The annotated crate must depend on `tracing` and `tracing-subscriber`.
///
/// # Example
/// ```rust,ignore
/// use vigil_macros::test_traced;
///
/// #[test_traced(level = "INFO")]
/// fn test_info_level() {
///     tracing::info!("visible");
///     tracing::debug!("filtered");
/// }
/// ```
#[proc_macro_attribute]
pub fn test_traced(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    let input = parse_macro_input!(item as ItemFn);

    // Parse the requested level
    let mut level = String::from("DEBUG");
    for arg in args {
        match arg {
            NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("level") => match nv.lit {
                Lit::Str(value) => level = value.value().to_uppercase(),
                other => {
                    return syn::Error::new_spanned(other, "level must be a string")
                        .to_compile_error()
                        .into();
                }
            },
            other => {
                return syn::Error::new_spanned(other, "unsupported argument (expected `level`)")
                    .to_compile_error()
                    .into();
            }
        }
    }
    let level = match level.as_str() {
        "TRACE" | "DEBUG" | "INFO" | "WARN" | "ERROR" => {
            syn::Ident::new(&level, proc_macro2::Span::call_site())
        }
        _ => {
            return syn::Error::new(
                proc_macro2::Span::call_site(),
                "level must be one of TRACE, DEBUG, INFO, WARN, ERROR",
            )
            .to_compile_error()
            .into();
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis #sig {
            let subscriber = ::tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(::tracing::Level::#level)
                .with_line_number(true)
                .finish();
            let dispatcher = ::tracing::Dispatch::new(subscriber);
            ::tracing::dispatcher::with_default(&dispatcher, || #block)
        }
    };
    TokenStream::from(expanded)
}
