use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Marks a function as a test that runs with diagnostic logging enabled
///
/// The test body runs on the regular test harness thread; the attribute only
/// installs the `env_logger` backend (once per process) before it starts.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return syn::Error::new_spanned(attr, "tasksim::test takes no arguments")
            .to_compile_error()
            .into();
    }

    let input = parse_macro_input!(item as ItemFn);

    if let Some(asyncness) = &input.sig.asyncness {
        return syn::Error::new_spanned(asyncness, "tasksim actors run on threads, not futures")
            .to_compile_error()
            .into();
    }

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;

    let expanded = quote! {
        #[::core::prelude::v1::test]
        #(#attrs)*
        #vis #sig {
            ::tasksim::logging::init_for_tests();
            #body
        }
    };

    expanded.into()
}
