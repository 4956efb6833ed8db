#![doc = include_str!("../README.md")]

use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    struct UntilFn {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    struct UntilBody {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct Body {
        items: BraceGroup,
    }

    struct FunctionDecl {
        until_fn: UntilFn, _fn: KFn, name: Ident,
        until_body: UntilBody, body: Body
    }
}

impl quote::ToTokens for UntilFn {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for UntilBody {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for Body {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        tokens.extend(self.items.0.stream())
    }
}

impl UntilBody {
    /// Whether the signature already spells out a return type.
    fn returns(&self) -> bool {
        let mut previous_dash = false;
        for token in quote::ToTokens::to_token_stream(self) {
            match token {
                TokenTree::Punct(p) if p.as_char() == '>' && previous_dash => return true,
                TokenTree::Punct(p) => previous_dash = p.as_char() == '-',
                _ => previous_dash = false,
            }
        }
        false
    }
}

/// Marks a test that may use `?`, after running `tabula_testhelpers::setup()`.
///
/// Without a return type the test returns `eyre::Result<()>` and `Ok(())` is appended to
/// the body. A test that declares its own return type is left as written.
#[proc_macro_attribute]
pub fn test(
    _attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let mut i = item.to_token_iter();
    let fdecl = i.parse::<FunctionDecl>().unwrap();

    let FunctionDecl {
        until_fn,
        _fn,
        name,
        until_body,
        body,
    } = fdecl;

    if until_body.returns() {
        return quote::quote! {
            #[::core::prelude::rust_2024::test]
            #until_fn fn #name #until_body {
                ::tabula_testhelpers::setup();

                #body
            }
        }
        .into();
    }

    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #until_fn fn #name #until_body -> ::tabula_testhelpers::eyre::Result<()> {
            ::tabula_testhelpers::setup();

            #body

            Ok(())
        }
    }
    .into()
}
