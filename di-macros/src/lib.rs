//! Derive macros behind the service container.
//!
//! `#[derive(Context)]` turns every field of the container into something a
//! service can ask for; `#[derive(FromContext)]` assembles a service from
//! those fields. Both expand to impls of `crate::FromRef`, so the consuming
//! crate must expose that trait at its root.

use proc_macro::TokenStream;
use syn::punctuated::Punctuated;
use syn::{token::Comma, Data, DeriveInput, Field, Fields};

mod context;
mod from_context;

/// Returns the named fields of a struct, or a spanned error naming `derive`.
pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a Punctuated<Field, Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{} can only be derived for structs with named fields", derive),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{} can only be derived for structs", derive),
        )),
    }
}

/// Derive macro for creating a DI context.
///
/// When applied to a struct, generates `FromRef` implementations for each
/// field type, allowing them to be extracted from the context.
///
/// # Requirements
///
/// - All fields must implement `Clone`
/// - The struct itself should derive `Clone`
///
/// # Example
///
/// ```ignore
/// use di_macros::{Context, FromRef};
///
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub namespaces: AppNamespaces,
///     pub transactions: AppTransactions,
///     pub config: AppConfig,
/// }
///
/// // Generated implementations:
/// // impl FromRef<Context> for AppNamespaces { ... }
/// // impl FromRef<Context> for AppTransactions { ... }
/// // impl FromRef<Context> for AppConfig { ... }
/// ```
#[proc_macro_derive(Context)]
pub fn derive_context(input: TokenStream) -> TokenStream {
    context::derive_context_impl(input)
}

/// Derive macro for types that can be constructed from a context.
///
/// When applied to a struct, generates a `FromRef<Context>` implementation
/// that resolves each field by calling `FromRef::from_ref` on the context.
///
/// # Requirements
///
/// - Each field type must implement `FromRef<Context>`
/// - The context type defaults to `Context` but can be overridden with
///   `#[from_context(Context = "MyContext")]`
///
/// # Example
///
/// ```ignore
/// use di_macros::{FromContext, FromRef};
///
/// #[derive(FromContext, Clone)]
/// pub struct TermService {
///     terms: AppTerms,                  // resolved via AppTerms::from_ref(ctx)
///     vocabularies: VocabularyService,  // itself FromContext
/// }
///
/// // Generated implementation:
/// // impl FromRef<Context> for TermService {
/// //     fn from_ref(ctx: &Context) -> Self {
/// //         Self {
/// //             terms: AppTerms::from_ref(ctx),
/// //             vocabularies: VocabularyService::from_ref(ctx),
/// //         }
/// //     }
/// // }
/// ```
///
/// # Custom Context Type
///
/// ```ignore
/// #[derive(FromContext)]
/// #[from_context(Context = "TestContext")]
/// pub struct NamespaceService {
///     namespaces: AppNamespaces,
/// }
/// ```
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    from_context::derive_from_context_impl(input)
}
