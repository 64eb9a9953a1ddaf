use darling::util::PathList;
use darling::FromDeriveInput;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Options accepted by `#[exception(...)]`.
#[derive(FromDeriveInput)]
#[darling(attributes(exception), supports(struct_any, enum_any))]
struct ExceptionArgs {
    ident: syn::Ident,
    generics: syn::Generics,

    /// Direct supertypes, nearest first.
    #[darling(default)]
    extends: PathList,

    /// Name reported in logs and registration errors.
    #[darling(default)]
    name: Option<String>,
}

pub fn derive_exception(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match ExceptionArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };

    match generate_exception_impl(&args) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_exception_impl(args: &ExceptionArgs) -> syn::Result<TokenStream2> {
    // A generic type would need one descriptor per instantiation, and statics
    // cannot be generic.
    if !args.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &args.generics,
            "#[derive(Exception)] does not support generic types",
        ));
    }

    let ident = &args.ident;
    let name = args.name.clone().unwrap_or_else(|| ident.to_string());
    let parents = args.extends.iter();

    Ok(quote! {
        impl ::problemkit::exception::ExceptionClass for #ident {
            fn descriptor() -> &'static ::problemkit::exception::ExceptionType {
                static DESCRIPTOR: ::problemkit::exception::ExceptionType =
                    ::problemkit::exception::ExceptionType::new(
                        #name,
                        &[#(<#parents as ::problemkit::exception::ExceptionClass>::descriptor),*],
                    );
                &DESCRIPTOR
            }
        }

        impl ::problemkit::exception::Exception for #ident {
            fn exception_type(&self) -> &'static ::problemkit::exception::ExceptionType {
                <Self as ::problemkit::exception::ExceptionClass>::descriptor()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    })
}
