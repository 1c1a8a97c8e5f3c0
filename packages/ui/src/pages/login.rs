use futures::future::LocalBoxFuture;

use crate::content::{PageBody, PageContent};
use crate::error::PageError;
use crate::page::{Page, PageContext};

/// The standalone sign-in screen. The form itself lives in the view layer.
#[derive(Debug, Default)]
pub struct LoginPage;

impl<B> Page<B> for LoginPage {
    fn render<'a>(
        &'a mut self,
        _ctx: &'a PageContext<B>,
    ) -> LocalBoxFuture<'a, Result<PageContent, PageError>> {
        Box::pin(async { Ok(PageContent::new("Sign in", PageBody::LoginForm)) })
    }
}
