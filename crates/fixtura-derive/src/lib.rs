use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprArray, ExprPath, Fields, Ident,
    ItemImpl, Lit, Meta, Token, Visibility,
};

/// Derive macro that makes a struct buildable by the generic builder.
///
/// Generates `fixtura::Reflect` (the type is described as a complex entity)
/// and `fixtura::Entity` (parameterless constructor plus a property table
/// with one setter per field).
///
/// # Usage
///
/// ```ignore
/// #[derive(Debug, Default, serde::Serialize, serde::Deserialize, fixtura::Entity)]
/// #[fixture(non_default(age))]
/// pub struct Person {
///     pub name: String,
///     pub age: i32,
///     #[fixture(unique)]
///     pub id: u64,
///     #[fixture(one_of("admin", "user"))]
///     pub role: String,
///     #[fixture(skip)]
///     pub cache: Vec<u8>,
/// }
/// ```
///
/// Field types must implement `fixtura::Reflect` and `serde::Deserialize`;
/// the struct must implement `serde::Serialize` so it can be nested.
///
/// # Container attributes
///
/// - `construct = path::to::fn`: constructor used instead of `Default::default`.
/// - `no_default`: the type has no parameterless constructor; a builder must
///   override `construct_entity`.
/// - `unique(a, b)`, `non_default(c)`, `one_of(d = [1, 2])`: overrides of
///   the named fields.
///
/// # Field attributes
///
/// - `skip`: never assigned.
/// - `unique`, `non_default`, `one_of(value, ...)`.
///
/// Only `pub` structs can get a synthesized builder when they appear as a
/// nested property; properties of other types are left unset.
#[proc_macro_derive(Entity, attributes(fixture))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_entity(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive macro describing a unit-only enum to the generator.
///
/// Variant names follow `#[serde(rename = "...")]` and
/// `#[serde(rename_all = "...")]`, so generated names deserialize back:
///
/// ```ignore
/// #[derive(serde::Deserialize, fixtura::Reflect)]
/// #[serde(rename_all = "snake_case")]
/// enum Status { Active, OnHold }   // "active", "on_hold"
/// ```
#[proc_macro_derive(Reflect)]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_reflect(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Registers a hand-written builder with the builder locator.
///
/// ```ignore
/// #[derive(Default)]
/// pub struct PersonBuilder;
///
/// #[fixtura::custom_builder]
/// impl fixtura::EntityBuilder for PersonBuilder {
///     type Entity = Person;
/// }
/// ```
#[proc_macro_attribute]
pub fn custom_builder(args: TokenStream, item: TokenStream) -> TokenStream {
    if !args.is_empty() {
        let args = TokenStream2::from(args);
        return syn::Error::new_spanned(args, "custom_builder takes no arguments")
            .into_compile_error()
            .into();
    }
    let item = parse_macro_input!(item as ItemImpl);
    expand_custom_builder(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// ---------------------------------------------------------------------------
// #[derive(Entity)]
// ---------------------------------------------------------------------------

fn expand_entity(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Entity can only be derived for structs; use #[derive(Reflect)] for enums",
            ))
        }
    };

    let container = ContainerAttrs::parse(&input.attrs)?;
    let mut properties = Vec::new();
    let mut field_overrides = Vec::new();
    let mut field_names = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let prop_name = ident.unraw().to_string();
        let attrs = FieldAttrs::parse(&field.attrs)?;
        field_names.push(ident.unraw());

        if attrs.skip {
            properties.push(quote! {
                .property(::fixtura::descriptor::PropertyDescriptor::read_only(#prop_name))
            });
        } else {
            let ty = &field.ty;
            properties.push(quote! {
                .property(::fixtura::descriptor::PropertyDescriptor::writable(
                    #prop_name,
                    <#ty as ::fixtura::Reflect>::type_info,
                    |entity: &mut Self, value: ::fixtura::serde_json::Value|
                        -> ::core::result::Result<(), ::fixtura::serde_json::Error>
                    {
                        entity.#ident = ::fixtura::serde_json::from_value(value)?;
                        ::core::result::Result::Ok(())
                    },
                ))
            });
        }
        for kind in attrs.overrides {
            let kind = kind.expand();
            field_overrides.push(quote! { .with_override(#prop_name, #kind) });
        }
    }

    let mut container_overrides = Vec::new();
    for (field, kind) in &container.overrides {
        if !field_names.iter().any(|f| f == field) {
            return Err(syn::Error::new_spanned(
                field,
                format!("`{}` has no field named `{}`", name, field),
            ));
        }
        let prop_name = field.to_string();
        let kind = kind.expand();
        container_overrides.push(quote! { .with_override(#prop_name, #kind) });
    }

    let construct = match (&container.construct, container.no_default) {
        (Some(path), _) => quote! { ::core::option::Option::Some(#path()) },
        (None, true) => quote! { ::core::option::Option::None },
        (None, false) => quote! {
            ::core::option::Option::Some(<Self as ::core::default::Default>::default())
        },
    };
    let accessible = matches!(input.vis, Visibility::Public(_));

    Ok(quote! {
        impl ::fixtura::Reflect for #name {
            fn type_info() -> ::fixtura::TypeInfo {
                ::fixtura::TypeInfo::complex::<Self>(
                    ::core::module_path!(),
                    #accessible,
                    ::core::option::Option::Some(
                        ::fixtura::synthesize::template::<Self> as ::fixtura::reflect::SynthesizeFn,
                    ),
                )
            }
        }

        impl ::fixtura::Entity for #name {
            fn construct() -> ::core::option::Option<Self> {
                #construct
            }

            fn descriptor() -> ::fixtura::EntityDescriptor<Self> {
                ::fixtura::EntityDescriptor::new()
                    #(#properties)*
                    #(#container_overrides)*
                    #(#field_overrides)*
            }
        }
    })
}

enum Override {
    NonDefault,
    Unique,
    OneOf(Vec<Expr>),
}

impl Override {
    fn expand(&self) -> TokenStream2 {
        match self {
            Override::NonDefault => quote! { ::fixtura::OverrideKind::NonDefault },
            Override::Unique => quote! { ::fixtura::OverrideKind::Unique },
            Override::OneOf(values) => quote! {
                ::fixtura::OverrideKind::OneOf(::std::vec![
                    #(
                        ::fixtura::serde_json::to_value(&#values)
                            .unwrap_or(::fixtura::serde_json::Value::Null)
                    ),*
                ])
            },
        }
    }
}

#[derive(Default)]
struct ContainerAttrs {
    construct: Option<ExprPath>,
    no_default: bool,
    overrides: Vec<(Ident, Override)>,
}

impl ContainerAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = ContainerAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("fixture")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("construct") {
                    parsed.construct = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("no_default") {
                    parsed.no_default = true;
                } else if meta.path.is_ident("unique") {
                    meta.parse_nested_meta(|field| {
                        let ident = field.path.require_ident()?.unraw();
                        parsed.overrides.push((ident, Override::Unique));
                        Ok(())
                    })?;
                } else if meta.path.is_ident("non_default") {
                    meta.parse_nested_meta(|field| {
                        let ident = field.path.require_ident()?.unraw();
                        parsed.overrides.push((ident, Override::NonDefault));
                        Ok(())
                    })?;
                } else if meta.path.is_ident("one_of") {
                    meta.parse_nested_meta(|field| {
                        let ident = field.path.require_ident()?.unraw();
                        let values: ExprArray = field.value()?.parse()?;
                        let values = values.elems.into_iter().collect();
                        parsed.overrides.push((ident, Override::OneOf(values)));
                        Ok(())
                    })?;
                } else {
                    return Err(meta.error(
                        "unsupported fixture attribute; expected `construct`, `no_default`, \
                         `unique`, `non_default` or `one_of`",
                    ));
                }
                Ok(())
            })?;
        }
        if parsed.no_default && parsed.construct.is_some() {
            return Err(syn::Error::new_spanned(
                &parsed.construct,
                "`construct` and `no_default` are mutually exclusive",
            ));
        }
        Ok(parsed)
    }
}

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    overrides: Vec<Override>,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = FieldAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("fixture")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    parsed.skip = true;
                } else if meta.path.is_ident("unique") {
                    parsed.overrides.push(Override::Unique);
                } else if meta.path.is_ident("non_default") {
                    parsed.overrides.push(Override::NonDefault);
                } else if meta.path.is_ident("one_of") {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    let values = Punctuated::<Expr, Token![,]>::parse_terminated(&content)?;
                    parsed.overrides.push(Override::OneOf(values.into_iter().collect()));
                } else {
                    return Err(meta.error(
                        "unsupported fixture attribute; expected `skip`, `unique`, \
                         `non_default` or `one_of`",
                    ));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// #[derive(Reflect)]
// ---------------------------------------------------------------------------

fn expand_reflect(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Reflect can only be derived for unit-only enums; use #[derive(Entity)] for structs",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Reflect cannot be derived for generic enums",
        ));
    }

    let rename_all = get_serde_rename_all(&input.attrs);
    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Reflect supports unit variants only",
            ));
        }
        let serialized = get_serde_rename(&variant.attrs).unwrap_or_else(|| {
            let ident = variant.ident.unraw().to_string();
            match rename_all {
                Some(ref convention) => rename_variant(&ident, convention),
                None => ident,
            }
        });
        variants.push(serialized);
    }

    Ok(quote! {
        impl ::fixtura::Reflect for #name {
            fn type_info() -> ::fixtura::TypeInfo {
                ::fixtura::TypeInfo::enumeration::<Self>(
                    ::core::module_path!(),
                    &[#(#variants),*],
                )
            }
        }
    })
}

// ---------------------------------------------------------------------------
// #[custom_builder]
// ---------------------------------------------------------------------------

fn expand_custom_builder(item: ItemImpl) -> syn::Result<TokenStream2> {
    let is_entity_builder = item
        .trait_
        .as_ref()
        .and_then(|(_, path, _)| path.segments.last())
        .is_some_and(|segment| segment.ident == "EntityBuilder");
    if !is_entity_builder {
        return Err(syn::Error::new_spanned(
            &item.self_ty,
            "custom_builder must be placed on `impl EntityBuilder for YourBuilder`",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "generic builders cannot be registered",
        ));
    }

    let builder = &item.self_ty;
    Ok(quote! {
        #item

        ::fixtura::inventory::submit! {
            ::fixtura::locator::BuilderRegistration::of::<#builder>(
                ::core::module_path!(),
                ::core::stringify!(#builder),
            )
        }
    })
}

// ---------------------------------------------------------------------------
// Serde attribute parsing helpers
// ---------------------------------------------------------------------------

/// Extract `#[serde(rename_all = "...")]` from container attributes.
fn get_serde_rename_all(attrs: &[Attribute]) -> Option<String> {
    serde_name_value(attrs, "rename_all")
}

/// Extract `#[serde(rename = "...")]` from variant attributes.
fn get_serde_rename(attrs: &[Attribute]) -> Option<String> {
    serde_name_value(attrs, "rename")
}

fn serde_name_value(attrs: &[Attribute], key: &str) -> Option<String> {
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        let Ok(nested) = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
        else {
            continue;
        };
        for meta in &nested {
            if let Meta::NameValue(nv) = meta {
                if nv.path.is_ident(key) {
                    if let Expr::Lit(lit) = &nv.value {
                        if let Lit::Str(s) = &lit.lit {
                            return Some(s.value());
                        }
                    }
                }
            }
        }
    }
    None
}

/// Apply a serde `rename_all` convention to a PascalCase variant name.
fn rename_variant(name: &str, convention: &str) -> String {
    match convention {
        "lowercase" => name.to_ascii_lowercase(),
        "UPPERCASE" => name.to_ascii_uppercase(),
        "PascalCase" => name.to_string(),
        "camelCase" => to_camel_case(name),
        "snake_case" => to_snake_case(name),
        "SCREAMING_SNAKE_CASE" => to_snake_case(name).to_ascii_uppercase(),
        "kebab-case" => to_snake_case(name).replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => to_snake_case(name).replace('_', "-").to_ascii_uppercase(),
        _ => name.to_string(),
    }
}

fn to_camel_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.char_indices() {
        if i > 0 && ch.is_uppercase() {
            result.push('_');
        }
        result.extend(ch.to_lowercase());
    }
    result
}
